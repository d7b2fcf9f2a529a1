use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::request,
};

use crate::{
	model::Id,
	openapi::SECURITY_SCHEME_TOKEN,
	token::{self, Claims, Keys},
};

/// The identity behind a request, resolved from its bearer token.
///
/// If the `x-auth-token` header is missing, a [`token::Error::MissingToken`] is returned.
/// If the token is malformed, forged or expired, the request is rejected before
/// the handler runs.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{}", session.user_id);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub user_id: Id,
	pub claims: Claims,
}

impl Session {
	/// Resolves the raw value of the token header.
	pub fn from_header(keys: &Keys, header: Option<&str>) -> Result<Self, token::Error> {
		let header = header.ok_or(token::Error::MissingToken)?;
		let token = header
			.strip_prefix(token::PREFIX)
			.ok_or(token::Error::MalformedToken)?;

		let claims = keys.resolve(token.trim())?;

		Ok(Self {
			user_id: claims.sub,
			claims,
		})
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Keys: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = crate::Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let header = match parts.headers.get(token::HEADER) {
			Some(value) => Some(value.to_str().map_err(|_| token::Error::MalformedToken)?),
			None => None,
		};

		let session = Self::from_header(&Keys::from_ref(state), header)?;

		tracing::debug!(user = %session.user_id, expires = session.claims.exp, "resolved session");

		Ok(session)
	}
}

impl OperationInput for Session {
	/// Adds the bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_TOKEN.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}
