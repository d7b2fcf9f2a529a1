//! Post lifecycle, embedded comments and likes.
//!
//! Every mutation here is a single conditional update on one post document,
//! so concurrent requests on the same post cannot lose each other's writes.

use validator::Validate;

use super::{
	model::{Comment, CreateComment, CreatePost, Post, UpdatePost},
	Error,
};
use crate::{model::Id, store::Store};

/// How many times a like toggle is retried when the like state flips
/// between the conditional updates.
const LIKE_ATTEMPTS: usize = 3;

/// Whether a user likes a post after a toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LikeState {
	Liked,
	NotLiked,
}

#[tracing::instrument(skip(database, input))]
pub async fn create_post(
	database: &dyn Store,
	author: Id,
	input: CreatePost,
) -> Result<Post, crate::Error> {
	input.validate()?;

	let post = Post::new(author, input.message);
	database.insert_post(&post).await?;

	tracing::info!(monotonic_counter.posts_created = 1_u64, post = %post.id, "created post");

	Ok(post)
}

pub async fn get_post(database: &dyn Store, id: Id) -> Result<Post, crate::Error> {
	Ok(database.find_post(id).await?.ok_or(Error::UnknownPost(id))?)
}

/// Overwrites the fields present in `patch` on the post `id` written by `author`.
///
/// An empty patch leaves the post as it is.
#[tracing::instrument(skip(database, patch))]
pub async fn update_post(
	database: &dyn Store,
	id: Id,
	author: Id,
	patch: UpdatePost,
) -> Result<Post, crate::Error> {
	patch.validate()?;

	Ok(database
		.update_post(id, author, &patch)
		.await?
		.ok_or(Error::UnknownPost(id))?)
}

/// Deletes the post `id` written by `author`, returning the number of deleted posts.
#[tracing::instrument(skip(database))]
pub async fn delete_post(database: &dyn Store, id: Id, author: Id) -> Result<u64, crate::Error> {
	match database.delete_post(id, author).await? {
		0 => Err(Error::UnknownPost(id).into()),
		deleted => Ok(deleted),
	}
}

/// Likes the post if `user` has not liked it yet, otherwise removes the like.
///
/// Both directions are conditional on the current membership of `user` in
/// `liked_by`, so `likes` always equals the number of users that like the post.
#[tracing::instrument(skip(database))]
pub async fn toggle_like(
	database: &dyn Store,
	user: Id,
	id: Id,
) -> Result<(Post, LikeState), crate::Error> {
	for _ in 0..LIKE_ATTEMPTS {
		if let Some(post) = database.like_post(id, user).await? {
			tracing::info!(monotonic_counter.likes_toggled = 1_u64, "liked post");
			return Ok((post, LikeState::Liked));
		}

		if let Some(post) = database.unlike_post(id, user).await? {
			tracing::info!(monotonic_counter.likes_toggled = 1_u64, "unliked post");
			return Ok((post, LikeState::NotLiked));
		}

		// neither condition matched: the post is gone, or a concurrent
		// toggle by the same user flipped the state in between
		if database.find_post(id).await?.is_none() {
			return Err(Error::UnknownPost(id).into());
		}
	}

	Err(Error::Contended(id).into())
}

/// Appends a new comment by `author` to the post `id`.
#[tracing::instrument(skip(database, input))]
pub async fn add_comment(
	database: &dyn Store,
	id: Id,
	author: Id,
	input: CreateComment,
) -> Result<Post, crate::Error> {
	input.validate()?;

	let comment = Comment {
		id: Id::new(),
		from: author,
		content: input.content,
	};

	Ok(database
		.push_comment(id, &comment)
		.await?
		.ok_or(Error::UnknownPost(id))?)
}

/// Removes a comment from the post `id`.
///
/// A comment that does not exist is not an error: the post is returned unchanged.
#[tracing::instrument(skip(database))]
pub async fn remove_comment(database: &dyn Store, id: Id, comment: Id) -> Result<Post, crate::Error> {
	Ok(database
		.pull_comment(id, comment)
		.await?
		.ok_or(Error::UnknownPost(id))?)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		error::{ErrorKind, ErrorShape},
		store::MemoryStore,
	};

	async fn post(store: &MemoryStore, author: Id, message: &str) -> Post {
		create_post(
			store,
			author,
			CreatePost {
				message: message.into(),
			},
		)
		.await
		.unwrap()
	}

	fn comment(content: &str) -> CreateComment {
		CreateComment {
			content: content.into(),
		}
	}

	#[tokio::test]
	async fn test_create_post_starts_empty() {
		let store = MemoryStore::default();
		let author = Id::new();

		let created = post(&store, author, "hello").await;

		assert_eq!(created.from, author);
		assert_eq!(created.likes, 0);
		assert!(created.liked_by.is_empty());
		assert!(created.comments.is_empty());
		assert_eq!(get_post(&store, created.id).await.unwrap().message, "hello");
	}

	#[tokio::test]
	async fn test_create_post_rejects_oversized_message() {
		let store = MemoryStore::default();

		let error = create_post(
			&store,
			Id::new(),
			CreatePost {
				message: "a".repeat(256),
			},
		)
		.await
		.unwrap_err();

		assert_eq!(error.kind(), ErrorKind::Validation);
	}

	#[tokio::test]
	async fn test_like_toggle_is_its_own_inverse() {
		let store = MemoryStore::default();
		let created = post(&store, Id::new(), "hello").await;
		let alice = Id::new();
		let bob = Id::new();

		let (liked, state) = toggle_like(&store, alice, created.id).await.unwrap();
		assert_eq!(state, LikeState::Liked);
		assert_eq!(liked.likes, 1);
		assert_eq!(liked.liked_by, vec![alice]);

		let (liked, _) = toggle_like(&store, bob, created.id).await.unwrap();
		assert_eq!(liked.likes, 2);

		let (unliked, state) = toggle_like(&store, alice, created.id).await.unwrap();
		assert_eq!(state, LikeState::NotLiked);
		assert_eq!(unliked.likes, 1);
		assert_eq!(unliked.liked_by, vec![bob]);
	}

	#[tokio::test]
	async fn test_concurrent_likes_keep_count_consistent() {
		let store = MemoryStore::default();
		let created = post(&store, Id::new(), "hello").await;
		let users = (0..16).map(|_| Id::new()).collect::<Vec<_>>();

		let toggles = users
			.iter()
			.map(|user| toggle_like(&store, *user, created.id));
		for result in futures::future::join_all(toggles).await {
			result.unwrap();
		}

		let stored = get_post(&store, created.id).await.unwrap();
		assert_eq!(stored.likes, 16);
		assert_eq!(stored.liked_by.len(), 16);
	}

	#[tokio::test]
	async fn test_like_unknown_post() {
		let store = MemoryStore::default();

		let error = toggle_like(&store, Id::new(), Id::new()).await.unwrap_err();

		assert_eq!(error.kind(), ErrorKind::NotFound);
	}

	#[tokio::test]
	async fn test_update_and_delete_are_keyed_on_author() {
		let store = MemoryStore::default();
		let author = Id::new();
		let created = post(&store, author, "hello").await;

		let error = update_post(
			&store,
			created.id,
			Id::new(),
			UpdatePost {
				message: Some("stolen".into()),
			},
		)
		.await
		.unwrap_err();
		assert_eq!(error.kind(), ErrorKind::NotFound);

		let updated = update_post(
			&store,
			created.id,
			author,
			UpdatePost {
				message: Some("edited".into()),
			},
		)
		.await
		.unwrap();
		assert_eq!(updated.message, "edited");

		let unchanged = update_post(&store, created.id, author, UpdatePost { message: None })
			.await
			.unwrap();
		assert_eq!(unchanged.message, "edited");

		assert_eq!(delete_post(&store, created.id, author).await.unwrap(), 1);
		assert_eq!(
			delete_post(&store, created.id, author)
				.await
				.unwrap_err()
				.kind(),
			ErrorKind::NotFound
		);
	}

	#[tokio::test]
	async fn test_comments_keep_order_and_tolerate_missing() {
		let store = MemoryStore::default();
		let author = Id::new();
		let commenter = Id::new();
		let created = post(&store, author, "hello").await;

		add_comment(&store, created.id, commenter, comment("one"))
			.await
			.unwrap();
		let with_two = add_comment(&store, created.id, commenter, comment("two"))
			.await
			.unwrap();

		let contents = with_two
			.comments
			.iter()
			.map(|c| c.content.as_str())
			.collect::<Vec<_>>();
		assert_eq!(contents, vec!["one", "two"]);

		let unchanged = remove_comment(&store, created.id, Id::new())
			.await
			.unwrap();
		assert_eq!(unchanged.comments.len(), 2);

		let first = with_two.comments[0].id;
		let removed = remove_comment(&store, created.id, first)
			.await
			.unwrap();
		assert_eq!(removed.comments.len(), 1);
		assert_eq!(removed.comments[0].content, "two");
	}

	#[tokio::test]
	async fn test_anyone_can_remove_a_comment() {
		let store = MemoryStore::default();
		let created = post(&store, Id::new(), "hello").await;

		let with_comment = add_comment(&store, created.id, Id::new(), comment("hi"))
			.await
			.unwrap();
		let id = with_comment.comments[0].id;

		let removed = remove_comment(&store, created.id, id).await.unwrap();
		assert!(removed.comments.is_empty());
		assert!(get_post(&store, created.id).await.unwrap().comments.is_empty());

		let error = remove_comment(&store, Id::new(), id).await.unwrap_err();
		assert_eq!(error.kind(), ErrorKind::NotFound);
	}

	#[tokio::test]
	async fn test_comment_validation_and_missing_post() {
		let store = MemoryStore::default();

		let error = add_comment(&store, Id::new(), Id::new(), comment("hi"))
			.await
			.unwrap_err();
		assert_eq!(error.kind(), ErrorKind::NotFound);

		let created = post(&store, Id::new(), "hello").await;
		let error = add_comment(&store, created.id, Id::new(), comment(&"a".repeat(151)))
			.await
			.unwrap_err();
		assert_eq!(error.kind(), ErrorKind::Validation);
	}
}
