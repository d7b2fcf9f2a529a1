#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod model;
mod openapi;
mod ratelimit;
mod route;
mod store;
mod token;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{extract::Request, Extension, Router, ServiceExt};
use tower::Layer;
use tower_http::{
	compression::CompressionLayer, normalize_path::NormalizePathLayer, trace::TraceLayer,
};

pub use error::Error;
pub use store::Database;

pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store handle, a hash configuration (it's expensive to create),
/// or the token signing keys.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub keys: token::Keys,
}

impl State {
	pub fn new(config: &config::Config, database: Database) -> Self {
		Self {
			database,
			hasher: Argon2::default(),
			keys: token::Keys::new(&config.token),
		}
	}
}

/// Builds the full router, with the OpenAPI document served under `/docs`.
pub fn app(state: State, limits: Option<&ratelimit::Limits>) -> Router {
	let mut api = OpenApi::default();

	aide::gen::extract_schemas(true);

	let mut credentials = route::user::credential_routes();

	if let Some(limits) = limits {
		credentials = credentials.layer(limits.secure_layer());
	}

	let router = ApiRouter::new()
		.nest("/users", credentials.merge(route::user::routes()))
		.nest("/posts", route::post::routes())
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(TraceLayer::new_for_http())
		.layer(CompressionLayer::new())
		.with_state(state);

	match limits {
		Some(limits) => router.layer(limits.default_layer()),
		None => router,
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();

	let config = config::Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(config.otlp_endpoint.as_deref())?;

	if config.token.is_default_secret() {
		tracing::warn!("JWT_SECRET is not set, using the default development secret");
	}

	let database = store::connect(&config.store).await?;

	let limits = if config.rate_limit {
		let limits = ratelimit::Limits::new()?;
		limits.spawn_cleanup();
		Some(limits)
	} else {
		None
	};

	let app = app(State::new(&config, database), limits.as_ref());
	let app = NormalizePathLayer::trim_trailing_slash().layer(app);

	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

	tracing::info!("listening on {}", listener.local_addr()?);

	axum::serve(
		listener,
		ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
	)
	.await?;

	Ok(())
}
