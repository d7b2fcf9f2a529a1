use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{Edge, Error, Store, UniqueField};
use crate::{
	model::Id,
	route::{
		post::model::{Comment, Post, UpdatePost},
		user::model::User,
	},
};

/// A store kept entirely in process memory.
///
/// Each method holds the lock for exactly one document operation, matching
/// the single-document atomicity of the real store.
#[derive(Debug, Default)]
pub struct MemoryStore {
	users: RwLock<HashMap<Id, User>>,
	posts: RwLock<IndexMap<Id, Post>>,
}

#[async_trait]
impl Store for MemoryStore {
	async fn insert_user(&self, user: &User) -> Result<(), Error> {
		let mut users = self.users.write().await;

		if users.values().any(|u| u.username == user.username) {
			return Err(Error::Duplicate(UniqueField::Username));
		}

		if users.values().any(|u| u.email == user.email) {
			return Err(Error::Duplicate(UniqueField::Email));
		}

		users.insert(user.id, user.clone());
		Ok(())
	}

	async fn find_user(&self, id: Id) -> Result<Option<User>, Error> {
		Ok(self.users.read().await.get(&id).cloned())
	}

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
		Ok(self
			.users
			.read()
			.await
			.values()
			.find(|u| u.username == username)
			.cloned())
	}

	async fn find_user_by_identity(&self, username: &str, email: &str) -> Result<Option<User>, Error> {
		Ok(self
			.users
			.read()
			.await
			.values()
			.find(|u| u.username == username || u.email == email)
			.cloned())
	}

	async fn find_users(&self, ids: &[Id]) -> Result<Vec<User>, Error> {
		let users = self.users.read().await;

		Ok(ids.iter().filter_map(|id| users.get(id)).cloned().collect())
	}

	async fn add_edge(&self, user: Id, edge: Edge, other: Id) -> Result<bool, Error> {
		let mut users = self.users.write().await;
		let Some(user) = users.get_mut(&user) else {
			return Ok(false);
		};

		let set = edge.select_mut(user);

		if !set.contains(&other) {
			set.push(other);
		}

		Ok(true)
	}

	async fn remove_edge(&self, user: Id, edge: Edge, other: Id) -> Result<bool, Error> {
		let mut users = self.users.write().await;
		let Some(user) = users.get_mut(&user) else {
			return Ok(false);
		};

		edge.select_mut(user).retain(|id| *id != other);
		Ok(true)
	}

	async fn insert_post(&self, post: &Post) -> Result<(), Error> {
		self.posts.write().await.insert(post.id, post.clone());
		Ok(())
	}

	async fn find_post(&self, id: Id) -> Result<Option<Post>, Error> {
		Ok(self.posts.read().await.get(&id).cloned())
	}

	async fn find_posts_by_authors(&self, authors: &[Id]) -> Result<Vec<Post>, Error> {
		Ok(self
			.posts
			.read()
			.await
			.values()
			.filter(|post| authors.contains(&post.from))
			.cloned()
			.collect())
	}

	async fn update_post(&self, id: Id, author: Id, patch: &UpdatePost) -> Result<Option<Post>, Error> {
		let mut posts = self.posts.write().await;

		Ok(posts
			.get_mut(&id)
			.filter(|post| post.from == author)
			.map(|post| {
				post.apply(patch);
				post.clone()
			}))
	}

	async fn delete_post(&self, id: Id, author: Id) -> Result<u64, Error> {
		let mut posts = self.posts.write().await;

		if posts.get(&id).is_some_and(|post| post.from == author) {
			posts.shift_remove(&id);
			return Ok(1);
		}

		Ok(0)
	}

	async fn like_post(&self, id: Id, user: Id) -> Result<Option<Post>, Error> {
		let mut posts = self.posts.write().await;

		Ok(posts
			.get_mut(&id)
			.filter(|post| !post.liked_by.contains(&user))
			.map(|post| {
				post.liked_by.push(user);
				post.likes += 1;
				post.clone()
			}))
	}

	async fn unlike_post(&self, id: Id, user: Id) -> Result<Option<Post>, Error> {
		let mut posts = self.posts.write().await;

		Ok(posts
			.get_mut(&id)
			.filter(|post| post.liked_by.contains(&user))
			.map(|post| {
				post.liked_by.retain(|id| *id != user);
				post.likes -= 1;
				post.clone()
			}))
	}

	async fn push_comment(&self, id: Id, comment: &Comment) -> Result<Option<Post>, Error> {
		let mut posts = self.posts.write().await;

		Ok(posts.get_mut(&id).map(|post| {
			post.comments.push(comment.clone());
			post.clone()
		}))
	}

	async fn pull_comment(&self, id: Id, comment: Id) -> Result<Option<Post>, Error> {
		let mut posts = self.posts.write().await;

		Ok(posts.get_mut(&id).map(|post| {
			if let Some(index) = post.comments.iter().position(|c| c.id == comment) {
				post.comments.remove(index);
			}

			post.clone()
		}))
	}
}
