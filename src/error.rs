use axum::{
	body::Body,
	extract::rejection::PathRejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use axum_jsonschema::JsonSchemaRejection;
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;

use crate::{
	route::{post, user},
	store, token,
};

pub type Map = serde_json::Map<String, serde_json::Value>;

/// The category of a failure, independent of where it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	Validation,
	NotFound,
	Conflict,
	Unauthenticated,
	Forbidden,
	RateLimited,
	Internal,
}

impl ErrorKind {
	pub fn status(self) -> StatusCode {
		match self {
			Self::Validation => StatusCode::BAD_REQUEST,
			Self::NotFound => StatusCode::NOT_FOUND,
			Self::Conflict => StatusCode::CONFLICT,
			Self::Unauthenticated => StatusCode::UNAUTHORIZED,
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
			Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

/// A single client-facing error message.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
	/// A machine-readable error code.
	pub content: String,
	/// The request field the error relates to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<String>,
	/// Extra structured information about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl Message {
	pub fn new(content: impl Into<String>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<String>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}
}

/// Describes how a module's error is presented to the client.
pub trait ErrorShape {
	fn kind(&self) -> ErrorKind;

	fn errors(&self) -> Vec<Message>;
}

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("invalid request body")]
	Json(JsonSchemaRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("token error: {0}")]
	Token(#[from] token::Error),
	#[error("user error: {0}")]
	User(#[from] user::Error),
	#[error("post error: {0}")]
	Post(#[from] post::Error),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("password hashing error: {0}")]
	Hash(argon2::password_hash::Error),
	#[error("rate limited: {0}")]
	RateLimit(#[from] GovernorError),
}

impl From<JsonSchemaRejection> for Error {
	fn from(rejection: JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub kind: ErrorKind,
	pub errors: Vec<Message>,
}

impl ErrorShape for Error {
	fn kind(&self) -> ErrorKind {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Path(..) => ErrorKind::Validation,
			Self::Token(error) => error.kind(),
			Self::User(error) => error.kind(),
			Self::Post(error) => error.kind(),
			Self::Store(error) => error.kind(),
			Self::Hash(..) => ErrorKind::Internal,
			Self::RateLimit(GovernorError::TooManyRequests { .. }) => ErrorKind::RateLimited,
			Self::RateLimit(..) => ErrorKind::Internal,
		}
	}

	fn errors(&self) -> Vec<Message> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| {
						Message::new(error.code.to_string())
							.field(field.to_string())
							.detail("message", error.to_string())
					})
				})
				.collect(),
			Self::Json(..) => vec![Message::new("invalid_body")],
			Self::Path(error) => vec![Message::new("invalid_path").detail("message", error.body_text())],
			Self::Token(error) => error.errors(),
			Self::User(error) => error.errors(),
			Self::Post(error) => error.errors(),
			Self::Store(error) => error.errors(),
			Self::Hash(..) => Vec::new(),
			Self::RateLimit(GovernorError::TooManyRequests { wait_time, .. }) => {
				vec![Message::new("rate_limited").detail("wait_time", *wait_time)]
			}
			Self::RateLimit(..) => Vec::new(),
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response<Body> {
		let kind = self.kind();

		if kind == ErrorKind::Internal {
			tracing::error!(error = %self, "request failed");
		} else {
			tracing::debug!(error = %self, ?kind, "request rejected");
		}

		// the schema rejection already carries a detailed body
		if let Self::Json(rejection) = self {
			return rejection.into_response();
		}

		(
			kind.status(),
			Json(ErrorResponse {
				success: false,
				kind,
				errors: self.errors(),
			}),
		)
			.into_response()
	}
}

impl aide::OperationOutput for Error {
	type Inner = ErrorResponse;
}
