use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};

use crate::{
	error::{self, ErrorKind, Message},
	model::Id,
	AppState,
};

pub mod graph;
pub mod identity;
pub mod model;
pub mod route;

/// An error that can occur while managing users.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(Id),
	#[error("unknown username")]
	UnknownUsername,
	#[error("invalid username or password")]
	InvalidCredentials,
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
	#[error("users cannot follow themselves")]
	SelfFollow,
}

/// Routes that accept credentials, kept apart so they can be rate limited harder.
pub fn credential_routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/signup", post_with(signup, signup_docs))
		.api_route("/login", post_with(login, login_docs))
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/:id", get_with(get_user, get_user_docs))
		.api_route("/:id/follow", post_with(follow_user, follow_user_docs))
		.api_route("/:id/followers", get_with(get_followers, get_followers_docs))
		.api_route("/:id/following", get_with(get_following, get_following_docs))
		.api_route("/:id/posts", get_with(get_user_posts, get_user_posts_docs))
}

impl error::ErrorShape for Error {
	fn kind(&self) -> ErrorKind {
		match self {
			Self::UnknownUser(..) | Self::UnknownUsername => ErrorKind::NotFound,
			Self::InvalidCredentials => ErrorKind::Unauthenticated,
			Self::UsernameTaken | Self::EmailTaken => ErrorKind::Conflict,
			Self::SelfFollow => ErrorKind::Validation,
		}
	}

	fn errors(&self) -> Vec<Message> {
		match self {
			Self::UnknownUser(user) => {
				vec![Message::new("unknown_user").detail("user", user.to_string())]
			}
			Self::UnknownUsername => vec![Message::new("unknown_user").field("username")],
			Self::InvalidCredentials => vec![Message::new("invalid_credentials")],
			Self::UsernameTaken => vec![Message::new("taken").field("username")],
			Self::EmailTaken => vec![Message::new("taken").field("email")],
			Self::SelfFollow => vec![Message::new("self_follow")],
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_signup_flow() {
		let app = app();

		let response = app
			.post("/users/signup")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 201);

		let id = response.json::<Value>()["id"].as_str().unwrap().to_owned();

		let response = app
			.post("/users/login")
			.json(&json!({
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let header = response.header(token::HEADER);
		let header = header.to_str().unwrap();
		assert!(header.starts_with(token::PREFIX));

		let body = response.json::<Value>();
		assert_eq!(body["user"]["username"], "john");
		assert_eq!(header, format!("{}{}", token::PREFIX, body["token"].as_str().unwrap()));

		let response = app
			.get(&format!("/users/{id}"))
			.add_header(auth_header_name(), auth_header(body["token"].as_str().unwrap()))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>(), json!({ "id": id, "username": "john" }));
	}

	#[tokio::test]
	async fn test_signup_rejects_duplicates_and_bad_input() {
		let app = app();

		signup(&app, "alice").await;

		let response = app
			.post("/users/signup")
			.json(&json!({
				"email": "alice@x.com",
				"username": "alice2",
				"password": "password1",
			}))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(response.json::<Value>()["kind"], "conflict");

		let response = app
			.post("/users/signup")
			.json(&json!({
				"email": "bob@x.com",
				"username": "b!",
				"password": "password1",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_signup_accepts_any_username_characters() {
		let app = app();
		let long = "b.".repeat(20);

		for (email, username) in [("a@x.com", "alice_smith"), ("b@x.com", long.as_str())] {
			let response = app
				.post("/users/signup")
				.json(&json!({
					"email": email,
					"username": username,
					"password": "p".repeat(300),
				}))
				.await;

			assert_eq!(response.status_code(), 201);
		}

		let response = app
			.post("/users/login")
			.json(&json!({ "username": "alice_smith", "password": "p".repeat(300) }))
			.await;
		assert_eq!(response.status_code(), 200);
	}

	#[tokio::test]
	async fn test_login_failures() {
		let app = app();

		signup(&app, "alice").await;

		let response = app
			.post("/users/login")
			.json(&json!({ "username": "alice", "password": "wrong-password" }))
			.await;
		assert_eq!(response.status_code(), 401);

		let response = app
			.post("/users/login")
			.json(&json!({ "username": "nobody", "password": "password1" }))
			.await;
		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_requires_token() {
		let app = app();
		let alice = signup(&app, "alice").await;

		let response = app.get(&format!("/users/{}", alice.id)).await;
		assert_eq!(response.status_code(), 401);
		assert_eq!(response.json::<Value>()["kind"], "unauthenticated");

		let response = app
			.get(&format!("/users/{}", alice.id))
			.add_header(auth_header_name(), auth_header("not.a.token"))
			.await;
		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_follow_toggle_and_followers() {
		let app = app();
		let alice = signup(&app, "alice").await;
		let bob = signup(&app, "bob").await;

		let response = bob.post(&app, &format!("/users/{}/follow", alice.id)).await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["state"], "following");

		let followers = bob.get(&app, &format!("/users/{}/followers", alice.id)).await;
		assert_eq!(
			followers.json::<Value>(),
			json!([{ "id": bob.id, "username": "bob" }])
		);

		let following = bob.get(&app, &format!("/users/{}/following", bob.id)).await;
		assert_eq!(
			following.json::<Value>(),
			json!([{ "id": alice.id, "username": "alice" }])
		);

		let response = bob.post(&app, &format!("/users/{}/follow", alice.id)).await;
		assert_eq!(response.json::<Value>()["state"], "not_following");

		let followers = bob.get(&app, &format!("/users/{}/followers", alice.id)).await;
		assert_eq!(followers.json::<Value>(), json!([]));
	}

	#[tokio::test]
	async fn test_unknown_user() {
		let app = app();
		let alice = signup(&app, "alice").await;

		let response = alice.get(&app, "/users/0123456789abcdef01234567").await;
		assert_eq!(response.status_code(), 404);

		let response = alice.get(&app, "/users/not-an-id").await;
		assert_eq!(response.status_code(), 400);
	}
}
