use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use crate::model::Id;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	/// The unique identifier of the resource.
	pub id: Id,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CommentPathInput {
	/// The post the comment belongs to.
	pub id: Id,
	/// The comment itself.
	pub cid: Id,
}
