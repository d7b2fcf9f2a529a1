pub mod docs;
pub mod model;
pub mod post;
pub mod user;

pub use model::{CommentPathInput, IdInput};
