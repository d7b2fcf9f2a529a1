use axum::{extract::State, http::StatusCode};
use macros::route;

use crate::{
	extract::{Json, Path, Session},
	openapi::tag,
	route::{post, IdInput},
	token, AppState, Database,
};

use super::{graph, identity, model};

/// Sign up
/// Registers a new account, returning its identifier.
#[route(tag = tag::USER)]
pub async fn signup(
	State(state): State<AppState>,
	Json(input): Json<model::RegisterInput>,
) -> Result<(StatusCode, Json<model::RegisterOutput>), crate::Error> {
	let id = identity::register(&*state.database, &state.hasher, input).await?;

	Ok((StatusCode::CREATED, Json(model::RegisterOutput { id })))
}

/// Log in
/// Checks a username and password, returning a bearer token in the body and in the `x-auth-token` header.
#[route(tag = tag::USER)]
pub async fn login(
	State(state): State<AppState>,
	Json(input): Json<model::LoginInput>,
) -> Result<([(&'static str, String); 1], Json<model::LoginOutput>), crate::Error> {
	let user = identity::authenticate(
		&*state.database,
		&state.hasher,
		&input.username,
		&input.password,
	)
	.await?;

	let token = state.keys.issue(user.id)?;

	tracing::info!(user = %user.id, "issued token");

	Ok((
		[(token::HEADER, format!("{}{token}", token::PREFIX))],
		Json(model::LoginOutput {
			token,
			user: user.into(),
		}),
	))
}

/// Get user
/// Returns the public profile of a user.
#[route(tag = tag::USER)]
pub async fn get_user(
	State(database): State<Database>,
	_session: Session,
	Path(path): Path<IdInput>,
) -> Result<Json<model::Profile>, crate::Error> {
	Ok(Json(graph::profile(&*database, path.id).await?))
}

/// Toggle follow
/// Follows the user if not already following them, otherwise unfollows them.
#[route(tag = tag::USER)]
pub async fn follow_user(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<IdInput>,
) -> Result<Json<model::FollowOutput>, crate::Error> {
	let state = graph::toggle(&*database, session.user_id, path.id).await?;

	Ok(Json(model::FollowOutput { state }))
}

/// Get followers
/// Returns the users following a user.
#[route(tag = tag::USER)]
pub async fn get_followers(
	State(database): State<Database>,
	_session: Session,
	Path(path): Path<IdInput>,
) -> Result<Json<Vec<model::Profile>>, crate::Error> {
	Ok(Json(graph::followers(&*database, path.id).await?))
}

/// Get following
/// Returns the users a user follows.
#[route(tag = tag::USER)]
pub async fn get_following(
	State(database): State<Database>,
	_session: Session,
	Path(path): Path<IdInput>,
) -> Result<Json<Vec<model::Profile>>, crate::Error> {
	Ok(Json(graph::following(&*database, path.id).await?))
}

/// Get user posts
/// Returns every post written by a user, in store order.
#[route(tag = tag::USER)]
pub async fn get_user_posts(
	State(database): State<Database>,
	_session: Session,
	Path(path): Path<IdInput>,
) -> Result<Json<Vec<post::model::Post>>, crate::Error> {
	Ok(Json(post::feed::user_posts(&*database, path.id).await?))
}
