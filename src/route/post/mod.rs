use aide::axum::{
	routing::{delete_with, get_with, post_with},
	ApiRouter,
};

use crate::{
	error::{self, ErrorKind, Message},
	model::Id,
	AppState,
};

pub mod content;
pub mod feed;
pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Id),
	#[error("user {user} does not own post {post}")]
	NotOwner { user: Id, post: Id },
	#[error("like on post {0} kept changing underneath the toggle")]
	Contended(Id),
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(get_feed, get_feed_docs))
		.api_route("/create", post_with(create_post, create_post_docs))
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs)
				.patch_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.api_route("/:id/like", post_with(like_post, like_post_docs))
		.api_route("/:id/comments", post_with(add_comment, add_comment_docs))
		.api_route(
			"/:id/comments/:cid",
			delete_with(remove_comment, remove_comment_docs),
		)
}

impl error::ErrorShape for Error {
	fn kind(&self) -> ErrorKind {
		match self {
			Self::UnknownPost(..) => ErrorKind::NotFound,
			Self::NotOwner { .. } => ErrorKind::Forbidden,
			Self::Contended(..) => ErrorKind::Internal,
		}
	}

	fn errors(&self) -> Vec<Message> {
		match self {
			Self::UnknownPost(post) => {
				vec![Message::new("unknown_post").detail("post", post.to_string())]
			}
			Self::NotOwner { post, .. } => {
				vec![Message::new("not_owner").detail("post", post.to_string())]
			}
			Self::Contended(..) => Vec::new(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_create_and_get_post() {
		let app = app();
		let alice = signup(&app, "alice").await;

		let response = alice
			.post_json(&app, "/posts/create", &json!({ "message": "hello" }))
			.await;
		assert_eq!(response.status_code(), 201);

		let post = response.json::<Value>();
		assert_eq!(post["from"], json!(alice.id));
		assert_eq!(post["likes"], 0);

		let response = alice
			.get(&app, &format!("/posts/{}", post["id"].as_str().unwrap()))
			.await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>(), post);
	}

	#[tokio::test]
	async fn test_create_post_validation() {
		let app = app();
		let alice = signup(&app, "alice").await;

		let response = alice
			.post_json(&app, "/posts/create", &json!({ "message": "a".repeat(256) }))
			.await;
		assert_eq!(response.status_code(), 400);

		let response = alice.post_json(&app, "/posts/create", &json!({})).await;
		assert_eq!(response.status_code(), 400);

		let response = app
			.post("/posts/create")
			.json(&json!({ "message": "hi" }))
			.await;
		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_owner_can_update_and_delete() {
		let app = app();
		let alice = signup(&app, "alice").await;
		let id = alice.create_post(&app, "hello").await;

		let response = alice
			.patch_json(&app, &format!("/posts/{id}"), &json!({ "message": "edited" }))
			.await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["message"], "edited");

		let response = alice.delete(&app, &format!("/posts/{id}")).await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["deleted"], 1);

		let response = alice.get(&app, &format!("/posts/{id}")).await;
		assert_eq!(response.status_code(), 404);

		let response = alice.delete(&app, &format!("/posts/{id}")).await;
		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_non_owner_is_forbidden() {
		let app = app();
		let alice = signup(&app, "alice").await;
		let bob = signup(&app, "bob").await;
		let id = alice.create_post(&app, "hello").await;

		let response = bob
			.patch_json(&app, &format!("/posts/{id}"), &json!({ "message": "mine now" }))
			.await;
		assert_eq!(response.status_code(), 403);
		assert_eq!(response.json::<Value>()["kind"], "forbidden");

		let response = bob.delete(&app, &format!("/posts/{id}")).await;
		assert_eq!(response.status_code(), 403);

		let post = alice.get(&app, &format!("/posts/{id}")).await.json::<Value>();
		assert_eq!(post["message"], "hello");
	}

	#[tokio::test]
	async fn test_comments() {
		let app = app();
		let alice = signup(&app, "alice").await;
		let bob = signup(&app, "bob").await;
		let carol = signup(&app, "carol").await;
		let id = alice.create_post(&app, "hello").await;

		let response = bob
			.post_json(&app, &format!("/posts/{id}/comments"), &json!({ "content": "first" }))
			.await;
		assert_eq!(response.status_code(), 201);

		let post = response.json::<Value>();
		assert_eq!(post["comments"][0]["content"], "first");
		assert_eq!(post["comments"][0]["from"], json!(bob.id));

		let comment = post["comments"][0]["id"].as_str().unwrap().to_owned();

		// removing an unknown comment leaves the post untouched
		let response = carol
			.delete(&app, &format!("/posts/{id}/comments/0123456789abcdef01234567"))
			.await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>(), post);

		// carol wrote neither the post nor the comment
		let response = carol
			.delete(&app, &format!("/posts/{id}/comments/{comment}"))
			.await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["comments"], json!([]));

		// already gone
		let response = alice
			.delete(&app, &format!("/posts/{id}/comments/{comment}"))
			.await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["comments"], json!([]));
	}

	#[tokio::test]
	async fn test_comment_on_unknown_post() {
		let app = app();
		let alice = signup(&app, "alice").await;

		let response = alice
			.post_json(
				&app,
				"/posts/0123456789abcdef01234567/comments",
				&json!({ "content": "hello?" }),
			)
			.await;
		assert_eq!(response.status_code(), 404);

		let response = alice
			.post(&app, "/posts/0123456789abcdef01234567/like")
			.await;
		assert_eq!(response.status_code(), 404);
	}
}
