use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::Id;

/// A comment embedded in a post.
#[model(create)]
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Comment {
	/// The unique identifier of the comment.
	#[serde(skip_deserializing)]
	pub id: Id,
	/// The user that wrote the comment.
	#[serde(skip_deserializing)]
	pub from: Id,
	/// The text of the comment.
	#[validate(length(min = 1, max = 150))]
	pub content: String,
}

/// A single post, created by a user.
#[model(create, update)]
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Id,
	/// The user that created the post.
	#[serde(skip_deserializing)]
	pub from: Id,
	/// The text of the post.
	#[validate(length(min = 1, max = 255))]
	pub message: String,
	/// The number of likes, always equal to the length of `liked_by`.
	#[serde(skip_deserializing)]
	pub likes: i64,
	/// The users who liked the post.
	#[serde(skip_deserializing)]
	pub liked_by: Vec<Id>,
	/// Comments in the order they were written.
	#[serde(skip_deserializing)]
	pub comments: Vec<Comment>,
}

impl Post {
	pub fn new(from: Id, message: String) -> Self {
		Self {
			id: Id::new(),
			from,
			message,
			likes: 0,
			liked_by: Vec::new(),
			comments: Vec::new(),
		}
	}

	/// Overwrites the fields present in `patch`.
	pub fn apply(&mut self, patch: &UpdatePost) {
		if let Some(message) = &patch.message {
			self.message.clone_from(message);
		}
	}
}

impl UpdatePost {
	pub fn is_empty(&self) -> bool {
		self.message.is_none()
	}
}

#[derive(Serialize, JsonSchema)]
pub struct DeletePostOutput {
	/// The number of deleted posts.
	pub deleted: u64,
}
