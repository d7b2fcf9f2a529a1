mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a documentation function for the route, named after the handler with the suffix `_docs`.
///
/// The first line of the doc comment becomes the summary and the remaining lines the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates input structs for a stored model: `CreateX` with `#[model(create)]`
/// and `UpdateX` (every field optional) with `#[model(update)]`.
///
/// Fields marked #[serde(skip_deserializing)] or #[serde(skip)] are server-assigned
/// and left out of both inputs. All other fields keep their attributes verbatim.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
