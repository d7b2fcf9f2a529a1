//! Feed composition on top of the follow graph.

use super::model::Post;
use crate::{model::Id, route::user, store::Store};

/// Returns every post written by `requester` or anyone they follow, in store order.
#[tracing::instrument(skip(database))]
pub async fn compose(database: &dyn Store, requester: Id) -> Result<Vec<Post>, crate::Error> {
	let user = database
		.find_user(requester)
		.await?
		.ok_or(user::Error::UnknownUser(requester))?;

	let mut authors = user.following;

	if !authors.contains(&requester) {
		authors.push(requester);
	}

	let posts = database.find_posts_by_authors(&authors).await?;

	tracing::debug!(authors = authors.len(), posts = posts.len(), "composed feed");

	Ok(posts)
}

/// Returns every post written by `author`, in store order.
pub async fn user_posts(database: &dyn Store, author: Id) -> Result<Vec<Post>, crate::Error> {
	if database.find_user(author).await?.is_none() {
		return Err(user::Error::UnknownUser(author).into());
	}

	Ok(database.find_posts_by_authors(&[author]).await?)
}
