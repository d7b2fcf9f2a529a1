use std::{env, str::FromStr, time::Duration};

/// Secret used when `JWT_SECRET` is not set. Fine for development only.
const DEFAULT_TOKEN_SECRET: &str = "abrakadabra";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid value {value:?} for {name}")]
	Invalid { name: &'static str, value: String },
}

/// Which [`crate::store::Store`] implementation backs the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
	Mongo,
	Memory,
}

impl FromStr for Backend {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"mongo" | "mongodb" => Ok(Self::Mongo),
			"memory" => Ok(Self::Memory),
			_ => Err(()),
		}
	}
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
	pub backend: Backend,
	pub host: String,
	pub port: u16,
	pub name: String,
	pub users_collection: String,
	pub posts_collection: String,
}

impl StoreConfig {
	pub fn uri(&self) -> String {
		format!("mongodb://{}:{}", self.host, self.port)
	}
}

#[derive(Clone, Debug)]
pub struct TokenConfig {
	pub secret: String,
	pub ttl: Duration,
}

impl TokenConfig {
	pub fn is_default_secret(&self) -> bool {
		self.secret == DEFAULT_TOKEN_SECRET
	}
}

/// Process configuration, read once at startup and passed explicitly
/// to everything that needs it.
#[derive(Clone, Debug)]
pub struct Config {
	pub host: String,
	pub port: u16,
	pub store: StoreConfig,
	pub token: TokenConfig,
	pub rate_limit: bool,
	pub otlp_endpoint: Option<String>,
}

fn var(name: &'static str, default: &str) -> String {
	env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn parse<T: FromStr>(name: &'static str, default: &str) -> Result<T, Error> {
	let value = var(name, default);

	value.parse().map_err(|_| Error::Invalid { name, value })
}

fn ttl_from_hours(hours: u64) -> Result<Duration, Error> {
	hours
		.checked_mul(60 * 60)
		.map(Duration::from_secs)
		.ok_or_else(|| Error::Invalid {
			name: "TOKEN_TTL_HOURS",
			value: hours.to_string(),
		})
}

impl Config {
	/// Reads the configuration from the environment, falling back to defaults.
	pub fn from_env() -> Result<Self, Error> {
		let secret = var("JWT_SECRET", DEFAULT_TOKEN_SECRET);

		Ok(Self {
			host: var("HOST", "127.0.0.1"),
			port: parse("PORT", "1323")?,
			store: StoreConfig {
				backend: parse("STORE", "mongo")?,
				host: var("DB_HOST", "localhost"),
				port: parse("DB_PORT", "27017")?,
				name: var("DB_NAME", "blog"),
				users_collection: var("USERS_COLLECTION", "users"),
				posts_collection: var("POSTS_COLLECTION", "posts"),
			},
			token: TokenConfig {
				secret,
				ttl: ttl_from_hours(parse("TOKEN_TTL_HOURS", "72")?)?,
			},
			rate_limit: parse("RATE_LIMIT", "true")?,
			otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
		})
	}
}

#[cfg(test)]
impl Config {
	/// An in-memory configuration with rate limiting and telemetry disabled.
	pub fn test() -> Self {
		Self {
			host: "127.0.0.1".into(),
			port: 0,
			store: StoreConfig {
				backend: Backend::Memory,
				host: "localhost".into(),
				port: 27017,
				name: "test".into(),
				users_collection: "users".into(),
				posts_collection: "posts".into(),
			},
			token: TokenConfig {
				secret: "test-secret".into(),
				ttl: Duration::from_secs(72 * 60 * 60),
			},
			rate_limit: false,
			otlp_endpoint: None,
		}
	}
}

#[cfg(test)]
mod test {
	use super::Backend;

	#[test]
	fn test_backend_parse() {
		assert_eq!("mongo".parse(), Ok(Backend::Mongo));
		assert_eq!("MEMORY".parse(), Ok(Backend::Memory));
		assert!("postgres".parse::<Backend>().is_err());
	}

	#[test]
	fn test_store_uri() {
		let config = super::Config::test();

		assert_eq!(config.store.uri(), "mongodb://localhost:27017");
	}

	#[test]
	fn test_default_secret_is_detected() {
		let mut config = super::Config::test();
		assert!(!config.token.is_default_secret());

		config.token.secret = super::DEFAULT_TOKEN_SECRET.into();
		assert!(config.token.is_default_secret());
	}

	#[test]
	fn test_token_ttl_overflow_is_rejected() {
		assert_eq!(
			super::ttl_from_hours(72).unwrap(),
			std::time::Duration::from_secs(72 * 60 * 60)
		);
		assert!(matches!(
			super::ttl_from_hours(u64::MAX),
			Err(super::Error::Invalid { name: "TOKEN_TTL_HOURS", .. })
		));
	}
}
