//! Registration and credential checks.

use argon2::{
	password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
	Argon2,
};
use validator::Validate;

use super::{
	model::{RegisterInput, User},
	Error,
};
use crate::{
	model::Id,
	store::{self, Store, UniqueField},
};

/// Hashes a password with Argon2 and a fresh random salt, returning a PHC string.
fn hash_password(hasher: &Argon2, password: &str) -> Result<String, crate::Error> {
	let salt = SaltString::generate(&mut OsRng);

	Ok(hasher
		.hash_password(password.as_bytes(), &salt)
		.map_err(crate::Error::Hash)?
		.to_string())
}

fn verify_password(hasher: &Argon2, password: &str, hash: &str) -> Result<bool, crate::Error> {
	let hash = PasswordHash::new(hash).map_err(crate::Error::Hash)?;

	match hasher.verify_password(password.as_bytes(), &hash) {
		Ok(()) => Ok(true),
		Err(argon2::password_hash::Error::Password) => Ok(false),
		Err(e) => Err(crate::Error::Hash(e)),
	}
}

/// Creates a new user, returning its identifier.
///
/// Fails with [`Error::UsernameTaken`] or [`Error::EmailTaken`] if either value
/// is already in use. The store's unique indexes back this check up when two
/// registrations race.
#[tracing::instrument(skip_all, fields(username = %input.username))]
pub async fn register(
	database: &dyn Store,
	hasher: &Argon2<'_>,
	input: RegisterInput,
) -> Result<Id, crate::Error> {
	input.validate()?;

	if let Some(existing) = database
		.find_user_by_identity(&input.username, &input.email)
		.await?
	{
		return Err(if existing.username == input.username {
			Error::UsernameTaken
		} else {
			Error::EmailTaken
		}
		.into());
	}

	let user = User {
		id: Id::new(),
		password: hash_password(hasher, &input.password)?,
		email: input.email,
		username: input.username,
		followers: Vec::new(),
		following: Vec::new(),
	};

	database.insert_user(&user).await.map_err(|e| match e {
		store::Error::Duplicate(UniqueField::Username) => Error::UsernameTaken.into(),
		store::Error::Duplicate(UniqueField::Email) => Error::EmailTaken.into(),
		e => crate::Error::Store(e),
	})?;

	tracing::info!(monotonic_counter.users_registered = 1_u64, user = %user.id, "registered user");

	Ok(user.id)
}

/// Checks a username and password, returning the matching user.
#[tracing::instrument(skip(database, hasher, password))]
pub async fn authenticate(
	database: &dyn Store,
	hasher: &Argon2<'_>,
	username: &str,
	password: &str,
) -> Result<User, crate::Error> {
	let user = database
		.find_user_by_username(username)
		.await?
		.ok_or(Error::UnknownUsername)?;

	if !verify_password(hasher, password, &user.password)? {
		return Err(Error::InvalidCredentials.into());
	}

	Ok(user)
}

#[cfg(test)]
mod test {
	use argon2::Argon2;

	use super::{authenticate, register};
	use crate::{
		error::{ErrorKind, ErrorShape},
		route::user::model::RegisterInput,
		store::{MemoryStore, Store},
	};

	fn input(username: &str, email: &str) -> RegisterInput {
		RegisterInput {
			username: username.into(),
			email: email.into(),
			password: "password1".into(),
		}
	}

	#[tokio::test]
	async fn test_register_and_authenticate() {
		let store = MemoryStore::default();
		let hasher = Argon2::default();

		let id = register(&store, &hasher, input("alice", "alice@x.com"))
			.await
			.unwrap();

		let stored = store.find_user(id).await.unwrap().unwrap();
		assert_ne!(stored.password, "password1");

		let user = authenticate(&store, &hasher, "alice", "password1")
			.await
			.unwrap();
		assert_eq!(user.id, id);
	}

	#[tokio::test]
	async fn test_duplicate_registration_is_rejected() {
		let store = MemoryStore::default();
		let hasher = Argon2::default();

		let id = register(&store, &hasher, input("alice", "alice@x.com"))
			.await
			.unwrap();

		for duplicate in [input("alice", "new@x.com"), input("bob", "alice@x.com")] {
			let error = register(&store, &hasher, duplicate).await.unwrap_err();

			assert_eq!(error.kind(), ErrorKind::Conflict);
		}

		assert!(store.find_user_by_username("bob").await.unwrap().is_none());
		assert_eq!(
			store
				.find_user_by_username("alice")
				.await
				.unwrap()
				.unwrap()
				.id,
			id
		);
	}

	#[tokio::test]
	async fn test_invalid_registration() {
		let store = MemoryStore::default();
		let hasher = Argon2::default();

		for invalid in [input("al", "al@x.com"), input("alice", "not-an-email")] {
			let error = register(&store, &hasher, invalid).await.unwrap_err();

			assert_eq!(error.kind(), ErrorKind::Validation);
		}
	}

	#[tokio::test]
	async fn test_authenticate_failures() {
		let store = MemoryStore::default();
		let hasher = Argon2::default();

		register(&store, &hasher, input("alice", "alice@x.com"))
			.await
			.unwrap();

		let unknown = authenticate(&store, &hasher, "bob", "password1")
			.await
			.unwrap_err();
		assert_eq!(unknown.kind(), ErrorKind::NotFound);

		let wrong = authenticate(&store, &hasher, "alice", "password2")
			.await
			.unwrap_err();
		assert_eq!(wrong.kind(), ErrorKind::Unauthenticated);
	}
}
