//! Ownership guard for post mutations.

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::request,
};

use super::{Path, Session};
use crate::{
	model::Id,
	route::{post, post::model::Post, IdInput},
	store::Store,
	token::Keys,
	Database,
};

/// Fetches the post `id` and checks that `subject` wrote it.
///
/// Performs no mutation. Fails with [`post::Error::UnknownPost`] if the post
/// does not exist and [`post::Error::NotOwner`] if someone else wrote it.
#[tracing::instrument(skip(database))]
pub async fn authorize(database: &dyn Store, subject: Id, id: Id) -> Result<Post, crate::Error> {
	let post = database
		.find_post(id)
		.await?
		.ok_or(post::Error::UnknownPost(id))?;

	if post.from != subject {
		tracing::warn!(owner = %post.from, "rejected mutation by non-owner");

		return Err(post::Error::NotOwner {
			user: subject,
			post: id,
		}
		.into());
	}

	Ok(post)
}

/// A post from the `:id` path segment, written by the requesting user.
///
/// The post is fetched once here and handed to the handler, which keys its
/// mutation on the post's author.
///
/// ```rust
/// async fn route(OwnedPost(post): OwnedPost) {
///   println!("{}", post.message);
/// }
/// ```
#[derive(Debug)]
pub struct OwnedPost(pub Post);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OwnedPost
where
	Database: FromRef<S>,
	Keys: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = crate::Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let session = Session::from_request_parts(parts, state).await?;
		let Path(path) = Path::<IdInput>::from_request_parts(parts, state).await?;

		let database = Database::from_ref(state);
		let post = authorize(&*database, session.user_id, path.id).await?;

		Ok(Self(post))
	}
}

impl OperationInput for OwnedPost {
	fn operation_input(ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		Session::operation_input(ctx, operation);
		axum::extract::Path::<IdInput>::operation_input(ctx, operation);
	}
}

#[cfg(test)]
mod test {
	use super::authorize;
	use crate::{
		error::{ErrorKind, ErrorShape},
		model::Id,
		route::post::model::Post,
		store::{MemoryStore, Store},
	};

	#[tokio::test]
	async fn test_authorize() {
		let store = MemoryStore::default();
		let author = Id::new();
		let post = Post::new(author, "hello".into());

		store.insert_post(&post).await.unwrap();

		assert_eq!(authorize(&store, author, post.id).await.unwrap().id, post.id);

		let error = authorize(&store, Id::new(), post.id).await.unwrap_err();
		assert_eq!(error.kind(), ErrorKind::Forbidden);

		let error = authorize(&store, author, Id::new()).await.unwrap_err();
		assert_eq!(error.kind(), ErrorKind::NotFound);

		// a denied check leaves the post as it was
		let stored = store.find_post(post.id).await.unwrap().unwrap();
		assert_eq!(stored.message, "hello");
		assert_eq!(stored.from, author);
	}
}
