//! The document store the service persists to.
//!
//! Every method maps to a single-document operation, so each one is atomic
//! on its own. Nothing here spans documents; callers that touch two
//! documents must only use idempotent operations (see [`Store::add_edge`]).

mod memory;
mod mongo;

use std::sync::Arc;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::{
	config::{Backend, StoreConfig},
	error::{ErrorKind, ErrorShape, Message},
	model::Id,
	route::{
		post::model::{Comment, Post, UpdatePost},
		user::model::User,
	},
};

/// A user field with a unique index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueField {
	Username,
	Email,
}

impl UniqueField {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Username => "username",
			Self::Email => "email",
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("duplicate {}", .0.as_str())]
	Duplicate(UniqueField),
	#[error("mongodb error: {0}")]
	Mongo(#[from] mongodb::error::Error),
}

impl ErrorShape for Error {
	fn kind(&self) -> ErrorKind {
		match self {
			Self::Duplicate(..) => ErrorKind::Conflict,
			Self::Mongo(..) => ErrorKind::Internal,
		}
	}

	fn errors(&self) -> Vec<Message> {
		match self {
			Self::Duplicate(field) => vec![Message::new("duplicate").field(field.as_str())],
			Self::Mongo(..) => Vec::new(),
		}
	}
}

/// One side of a follow edge, stored as a set on the user document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
	/// Users who follow this user.
	Followers,
	/// Users this user follows.
	Following,
}

impl Edge {
	pub fn field(self) -> &'static str {
		match self {
			Self::Followers => "followers",
			Self::Following => "following",
		}
	}

	pub fn select_mut(self, user: &mut User) -> &mut Vec<Id> {
		match self {
			Self::Followers => &mut user.followers,
			Self::Following => &mut user.following,
		}
	}
}

pub type Database = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync + 'static {
	/// Inserts a new user, failing with [`Error::Duplicate`] if the username or email is taken.
	async fn insert_user(&self, user: &User) -> Result<(), Error>;

	async fn find_user(&self, id: Id) -> Result<Option<User>, Error>;

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Error>;

	/// Finds a user with either the given username or the given email.
	async fn find_user_by_identity(&self, username: &str, email: &str) -> Result<Option<User>, Error>;

	async fn find_users(&self, ids: &[Id]) -> Result<Vec<User>, Error>;

	/// Adds `other` to the `edge` set of `user` if absent.
	///
	/// Returns `false` if `user` does not exist.
	async fn add_edge(&self, user: Id, edge: Edge, other: Id) -> Result<bool, Error>;

	/// Removes `other` from the `edge` set of `user` if present.
	///
	/// Returns `false` if `user` does not exist.
	async fn remove_edge(&self, user: Id, edge: Edge, other: Id) -> Result<bool, Error>;

	async fn insert_post(&self, post: &Post) -> Result<(), Error>;

	async fn find_post(&self, id: Id) -> Result<Option<Post>, Error>;

	/// Finds all posts written by any of `authors`, in store order.
	async fn find_posts_by_authors(&self, authors: &[Id]) -> Result<Vec<Post>, Error>;

	/// Overwrites the fields present in `patch` on the post `id` written by `author`.
	async fn update_post(&self, id: Id, author: Id, patch: &UpdatePost) -> Result<Option<Post>, Error>;

	/// Deletes the post `id` written by `author`, returning the number of deleted posts.
	async fn delete_post(&self, id: Id, author: Id) -> Result<u64, Error>;

	/// Adds a like from `user` if they have not liked the post yet.
	///
	/// Returns `None` if the post does not exist or is already liked by `user`.
	async fn like_post(&self, id: Id, user: Id) -> Result<Option<Post>, Error>;

	/// Removes the like from `user` if they have liked the post.
	///
	/// Returns `None` if the post does not exist or is not liked by `user`.
	async fn unlike_post(&self, id: Id, user: Id) -> Result<Option<Post>, Error>;

	/// Appends a comment, returning the updated post or `None` if it does not exist.
	async fn push_comment(&self, id: Id, comment: &Comment) -> Result<Option<Post>, Error>;

	/// Removes a comment, returning the (possibly unchanged) post or `None` if it does not exist.
	async fn pull_comment(&self, id: Id, comment: Id) -> Result<Option<Post>, Error>;
}

/// Opens the store selected by the configuration.
pub async fn connect(config: &StoreConfig) -> Result<Database, Error> {
	Ok(match config.backend {
		Backend::Memory => Arc::new(MemoryStore::default()),
		Backend::Mongo => Arc::new(MongoStore::connect(config).await?),
	})
}
