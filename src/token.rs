//! Bearer tokens: HS256-signed JWTs carrying the subject and an absolute expiry.

use std::{sync::Arc, time::Duration};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
	config::TokenConfig,
	error::{ErrorKind, ErrorShape, Message},
	model::Id,
};

type HmacSha256 = Hmac<Sha256>;

/// The request header carrying the token, as `Bearer <token>`.
pub const HEADER: &str = "x-auth-token";
pub const PREFIX: &str = "Bearer ";

const ALGORITHM: &str = "HS256";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("missing auth token")]
	MissingToken,
	#[error("malformed auth token")]
	MalformedToken,
	#[error("invalid token signature")]
	InvalidSignature,
	#[error("token expired")]
	Expired,
	#[error("unable to sign token")]
	Signing,
}

impl ErrorShape for Error {
	fn kind(&self) -> ErrorKind {
		match self {
			Self::Signing => ErrorKind::Internal,
			_ => ErrorKind::Unauthenticated,
		}
	}

	fn errors(&self) -> Vec<Message> {
		let content = match self {
			Self::MissingToken => "missing_token",
			Self::MalformedToken => "malformed_token",
			Self::InvalidSignature => "invalid_token",
			Self::Expired => "expired_token",
			Self::Signing => return Vec::new(),
		};

		vec![Message::new(content)]
	}
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
	alg: String,
	typ: String,
}

/// The verified payload of a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// The user the token was issued to.
	pub sub: Id,
	/// Absolute expiry, in Unix seconds.
	pub exp: i64,
}

/// Signing keys and token lifetime, derived once from the configuration.
#[derive(Clone)]
pub struct Keys {
	secret: Arc<[u8]>,
	ttl: Duration,
}

impl std::fmt::Debug for Keys {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Keys").field("ttl", &self.ttl).finish_non_exhaustive()
	}
}

impl Keys {
	pub fn new(config: &TokenConfig) -> Self {
		Self {
			secret: config.secret.as_bytes().into(),
			ttl: config.ttl,
		}
	}

	fn mac(&self) -> Result<HmacSha256, Error> {
		HmacSha256::new_from_slice(&self.secret).map_err(|_| Error::Signing)
	}

	/// Issues a token for `subject` that expires after the configured lifetime.
	pub fn issue(&self, subject: Id) -> Result<String, Error> {
		self.issue_at(subject, Utc::now().timestamp())
	}

	pub fn issue_at(&self, subject: Id, now: i64) -> Result<String, Error> {
		let header = Header {
			alg: ALGORITHM.into(),
			typ: "JWT".into(),
		};
		let exp = i64::try_from(self.ttl.as_secs())
			.ok()
			.and_then(|ttl| now.checked_add(ttl))
			.ok_or(Error::Signing)?;
		let claims = Claims { sub: subject, exp };

		let header = serde_json::to_vec(&header).map_err(|_| Error::Signing)?;
		let claims = serde_json::to_vec(&claims).map_err(|_| Error::Signing)?;
		let message = format!(
			"{}.{}",
			URL_SAFE_NO_PAD.encode(header),
			URL_SAFE_NO_PAD.encode(claims)
		);

		let mut mac = self.mac()?;
		mac.update(message.as_bytes());
		let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

		Ok(format!("{message}.{signature}"))
	}

	/// Verifies the signature and expiry of a token, returning its claims.
	pub fn resolve(&self, token: &str) -> Result<Claims, Error> {
		self.resolve_at(token, Utc::now().timestamp())
	}

	pub fn resolve_at(&self, token: &str, now: i64) -> Result<Claims, Error> {
		let mut parts = token.split('.');
		let (Some(header), Some(claims), Some(signature), None) =
			(parts.next(), parts.next(), parts.next(), parts.next())
		else {
			return Err(Error::MalformedToken);
		};

		let signature = URL_SAFE_NO_PAD
			.decode(signature)
			.map_err(|_| Error::MalformedToken)?;

		let mut mac = self.mac()?;
		mac.update(header.as_bytes());
		mac.update(b".");
		mac.update(claims.as_bytes());
		mac.verify_slice(&signature)
			.map_err(|_| Error::InvalidSignature)?;

		let header = URL_SAFE_NO_PAD
			.decode(header)
			.map_err(|_| Error::MalformedToken)?;
		let header = serde_json::from_slice::<Header>(&header).map_err(|_| Error::MalformedToken)?;

		if header.alg != ALGORITHM {
			return Err(Error::MalformedToken);
		}

		let claims = URL_SAFE_NO_PAD
			.decode(claims)
			.map_err(|_| Error::MalformedToken)?;
		let claims = serde_json::from_slice::<Claims>(&claims).map_err(|_| Error::MalformedToken)?;

		if claims.exp <= now {
			return Err(Error::Expired);
		}

		Ok(claims)
	}
}
