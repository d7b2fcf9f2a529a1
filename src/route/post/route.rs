use axum::{extract::State, http::StatusCode};
use macros::route;

use crate::{
	extract::{Json, OwnedPost, Path, Session},
	openapi::tag,
	route::{CommentPathInput, IdInput},
	Database,
};

use super::{content, feed, model};

/// Get feed
/// Returns your own posts and the posts of everyone you follow.
#[route(tag = tag::POST)]
pub async fn get_feed(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Vec<model::Post>>, crate::Error> {
	Ok(Json(feed::compose(&*database, session.user_id).await?))
}

/// Create post
/// Creates a new post authored by you.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreatePost>,
) -> Result<(StatusCode, Json<model::Post>), crate::Error> {
	let post = content::create_post(&*database, session.user_id, input).await?;

	Ok((StatusCode::CREATED, Json(post)))
}

/// Get single post
/// Returns a single post by its unique id.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	_session: Session,
	Path(path): Path<IdInput>,
) -> Result<Json<model::Post>, crate::Error> {
	Ok(Json(content::get_post(&*database, path.id).await?))
}

/// Update post
/// Overwrites the fields present in the body. Only the author of the post may update it.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(database): State<Database>,
	OwnedPost(post): OwnedPost,
	Json(patch): Json<model::UpdatePost>,
) -> Result<Json<model::Post>, crate::Error> {
	let post = content::update_post(&*database, post.id, post.from, patch).await?;

	Ok(Json(post))
}

/// Delete post
/// Deletes a post and its comments. Only the author of the post may delete it.
#[route(tag = tag::POST)]
pub async fn delete_post(
	State(database): State<Database>,
	OwnedPost(post): OwnedPost,
) -> Result<Json<model::DeletePostOutput>, crate::Error> {
	let deleted = content::delete_post(&*database, post.id, post.from).await?;

	Ok(Json(model::DeletePostOutput { deleted }))
}

/// Toggle like
/// Likes the post if you have not liked it yet, otherwise removes your like.
#[route(tag = tag::POST)]
pub async fn like_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<IdInput>,
) -> Result<Json<model::Post>, crate::Error> {
	let (post, _) = content::toggle_like(&*database, session.user_id, path.id).await?;

	Ok(Json(post))
}

/// Add comment
/// Appends a comment authored by you to a post.
#[route(tag = tag::POST)]
pub async fn add_comment(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<IdInput>,
	Json(input): Json<model::CreateComment>,
) -> Result<(StatusCode, Json<model::Post>), crate::Error> {
	let post = content::add_comment(&*database, path.id, session.user_id, input).await?;

	Ok((StatusCode::CREATED, Json(post)))
}

/// Remove comment
/// Removes a comment from a post. Removing a comment that does not exist leaves the post unchanged.
#[route(tag = tag::POST)]
pub async fn remove_comment(
	State(database): State<Database>,
	_session: Session,
	Path(path): Path<CommentPathInput>,
) -> Result<Json<model::Post>, crate::Error> {
	let post = content::remove_comment(&*database, path.id, path.cid).await?;

	Ok(Json(post))
}
