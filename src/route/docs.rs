use std::sync::Arc;

use aide::{
	axum::{routing::get_with, ApiRouter, IntoApiResponse},
	openapi::OpenApi,
};
use axum::{response::IntoResponse, Extension};

pub fn routes<S>() -> ApiRouter<S>
where
	S: Clone + Send + Sync + 'static,
{
	ApiRouter::new().api_route(
		"/api.json",
		get_with(serve_docs, |op| {
			op.summary("OpenAPI document")
				.description("The OpenAPI document describing this service.")
		}),
	)
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	axum::Json(&*api).into_response()
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_serves_openapi_document() {
		let app = app();

		let response = app.get("/docs/api.json").await;
		assert_eq!(response.status_code(), 200);

		let document = response.json::<Value>();
		assert!(document["paths"]["/users/signup"]["post"].is_object());
		assert!(document["components"]["securitySchemes"]["Token"].is_object());
	}
}
