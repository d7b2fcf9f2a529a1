use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::Id;

/// A single user, as stored.
///
/// Never returned to clients directly, use [`Profile`] instead.
#[derive(Clone, Debug)]
pub struct User {
	pub id: Id,
	/// The user's email address, unique across users.
	pub email: String,
	/// The argon2 PHC string of the user's password.
	pub password: String,
	pub username: String,
	/// Users who follow this user.
	pub followers: Vec<Id>,
	/// Users this user follows.
	pub following: Vec<Id>,
}

/// The public view of a user.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Profile {
	/// The unique identifier of the user.
	pub id: Id,
	/// The username that is displayed to the public.
	pub username: String,
}

impl From<User> for Profile {
	fn from(user: User) -> Self {
		Self {
			id: user.id,
			username: user.username,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 300))]
	pub password: String,
	/// The username that is displayed to the public.
	#[validate(length(min = 3))]
	pub username: String,
}

#[derive(Serialize, JsonSchema)]
pub struct RegisterOutput {
	/// The identifier of the new user.
	pub id: Id,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(length(min = 1))]
	pub username: String,
	#[validate(length(min = 1, max = 300))]
	pub password: String,
}

#[derive(Serialize, JsonSchema)]
pub struct LoginOutput {
	/// The bearer token to send in the `x-auth-token` header.
	pub token: String,
	pub user: Profile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
	Following,
	NotFollowing,
}

#[derive(Serialize, JsonSchema)]
pub struct FollowOutput {
	/// The relation from the requesting user to the target after the toggle.
	pub state: FollowState,
}
