//! The follow graph.
//!
//! An edge "A follows B" is a pair of set memberships living on two
//! documents: `B ∈ A.following` and `A ∈ B.followers`. The store cannot
//! write both atomically, so both halves use set-insert and set-remove,
//! which are idempotent and order-independent. A half-written edge is
//! repaired by repeating the same call.

use super::{
	model::{FollowState, Profile, User},
	Error,
};
use crate::{
	model::Id,
	store::{Edge, Store},
};

async fn find_user(database: &dyn Store, id: Id) -> Result<User, crate::Error> {
	Ok(database
		.find_user(id)
		.await?
		.ok_or(Error::UnknownUser(id))?)
}

/// Makes `from` follow `to`. Following someone twice is a no-op.
#[tracing::instrument(skip(database))]
pub async fn follow(database: &dyn Store, from: Id, to: Id) -> Result<(), crate::Error> {
	if from == to {
		return Err(Error::SelfFollow.into());
	}

	find_user(database, to).await?;

	if !database.add_edge(from, Edge::Following, to).await? {
		return Err(Error::UnknownUser(from).into());
	}

	if !database.add_edge(to, Edge::Followers, from).await? {
		return Err(Error::UnknownUser(to).into());
	}

	Ok(())
}

/// Makes `from` stop following `to`. Unfollowing someone not followed is a no-op.
#[tracing::instrument(skip(database))]
pub async fn unfollow(database: &dyn Store, from: Id, to: Id) -> Result<(), crate::Error> {
	find_user(database, to).await?;

	if !database.remove_edge(from, Edge::Following, to).await? {
		return Err(Error::UnknownUser(from).into());
	}

	if !database.remove_edge(to, Edge::Followers, from).await? {
		return Err(Error::UnknownUser(to).into());
	}

	Ok(())
}

/// Follows or unfollows `to` depending on the current relation.
///
/// Only a complete edge counts as following, so a half-written edge is
/// completed rather than removed.
pub async fn toggle(database: &dyn Store, from: Id, to: Id) -> Result<FollowState, crate::Error> {
	let source = find_user(database, from).await?;
	let target = find_user(database, to).await?;

	if source.following.contains(&to) && target.followers.contains(&from) {
		unfollow(database, from, to).await?;
		Ok(FollowState::NotFollowing)
	} else {
		follow(database, from, to).await?;
		Ok(FollowState::Following)
	}
}

/// Returns the public profiles of everyone following `id`.
pub async fn followers(database: &dyn Store, id: Id) -> Result<Vec<Profile>, crate::Error> {
	let user = find_user(database, id).await?;
	let users = database.find_users(&user.followers).await?;

	Ok(users.into_iter().map(Profile::from).collect())
}

/// Returns the public profiles of everyone `id` follows.
pub async fn following(database: &dyn Store, id: Id) -> Result<Vec<Profile>, crate::Error> {
	let user = find_user(database, id).await?;
	let users = database.find_users(&user.following).await?;

	Ok(users.into_iter().map(Profile::from).collect())
}

/// Returns the public profile of `id`.
pub async fn profile(database: &dyn Store, id: Id) -> Result<Profile, crate::Error> {
	find_user(database, id).await.map(Profile::from)
}
