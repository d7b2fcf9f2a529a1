use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::middleware::StateInformationMiddleware;
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::PeerIpKeyExtractor,
	GovernorError, GovernorLayer,
};

pub type Config = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

#[derive(Debug, thiserror::Error)]
#[error("invalid rate limit quota")]
pub struct Error;

/// Per-IP limits: a lenient one for the whole API and a strict one for
/// the credential endpoints.
#[derive(Clone)]
pub struct Limits {
	pub default: Config,
	pub secure: Config,
}

impl Limits {
	pub fn new() -> Result<Self, Error> {
		Ok(Self {
			default: default()?,
			secure: secure()?,
		})
	}

	pub fn default_layer(&self) -> GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware> {
		GovernorLayer {
			config: self.default.clone(),
		}
	}

	pub fn secure_layer(&self) -> GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware> {
		GovernorLayer {
			config: self.secure.clone(),
		}
	}

	/// Spawns a thread that periodically drops limiter state for idle clients.
	pub fn spawn_cleanup(&self) {
		let limiters = [&self.default, &self.secure]
			.iter()
			.map(|config| config.limiter().clone())
			.collect::<Vec<_>>();
		let interval = Duration::from_secs(60);

		std::thread::spawn(move || loop {
			std::thread::sleep(interval);

			for limiter in &limiters {
				tracing::debug!("rate limiting storage size: {}", limiter.len());

				limiter.retain_recent();
			}
		});
	}
}

fn default() -> Result<Config, Error> {
	GovernorConfigBuilder::default()
		.per_second(10)
		.burst_size(50)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
		.ok_or(Error)
}

fn secure() -> Result<Config, Error> {
	GovernorConfigBuilder::default()
		.per_second(1)
		.burst_size(5)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
		.ok_or(Error)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	crate::Error::from(error).into_response()
}

#[cfg(test)]
mod test {
	#[test]
	fn test_limits_build() {
		assert!(super::Limits::new().is_ok());
	}
}
