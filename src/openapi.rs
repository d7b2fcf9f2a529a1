use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{
	error::{ErrorKind, ErrorResponse, Message},
	extract::Json,
	token,
};

pub const SECURITY_SCHEME_TOKEN: &str = "Token";

pub mod tag {
	pub const USER: &str = "User";
	pub const POST: &str = "Post";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Social API")
		.summary("Users, follows, posts, comments and likes")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::USER.into(),
			description: Some("Accounts and the follow graph".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Posts, comments, likes and the feed".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_TOKEN,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Header,
				name: token::HEADER.into(),
				description: Some("A bearer token from /users/login, sent as `Bearer <token>`".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<ErrorResponse>, _>(|res| {
			res.example(ErrorResponse {
				success: false,
				kind: ErrorKind::NotFound,
				errors: vec![Message::new("unknown_post").detail("post", "0123456789abcdef01234567")],
			})
		})
}
