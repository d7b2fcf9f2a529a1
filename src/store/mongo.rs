use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
	bson::{doc, oid::ObjectId, Document},
	error::{ErrorKind, WriteFailure},
	options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
	Client, Collection, IndexModel,
};
use serde::{Deserialize, Serialize};

use super::{Edge, Error, Store, UniqueField};
use crate::{
	config::StoreConfig,
	model::Id,
	route::{
		post::model::{Comment, Post, UpdatePost},
		user::model::User,
	},
};

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// Name of the unique email index, as it appears in duplicate key messages.
const EMAIL_INDEX: &str = "index: email_1";

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
	#[serde(rename = "_id")]
	id: ObjectId,
	username: String,
	email: String,
	password: String,
	#[serde(default)]
	followers: Vec<ObjectId>,
	#[serde(default)]
	following: Vec<ObjectId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CommentDocument {
	#[serde(rename = "_id")]
	id: ObjectId,
	from: ObjectId,
	content: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PostDocument {
	#[serde(rename = "_id")]
	id: ObjectId,
	from: ObjectId,
	message: String,
	#[serde(default)]
	likes: i64,
	#[serde(default, rename = "likedBy")]
	liked_by: Vec<ObjectId>,
	#[serde(default)]
	comments: Vec<CommentDocument>,
}

fn ids(ids: &[Id]) -> Vec<ObjectId> {
	ids.iter().copied().map(Id::into_inner).collect()
}

impl From<&User> for UserDocument {
	fn from(user: &User) -> Self {
		Self {
			id: user.id.into_inner(),
			username: user.username.clone(),
			email: user.email.clone(),
			password: user.password.clone(),
			followers: ids(&user.followers),
			following: ids(&user.following),
		}
	}
}

impl From<UserDocument> for User {
	fn from(user: UserDocument) -> Self {
		Self {
			id: user.id.into(),
			username: user.username,
			email: user.email,
			password: user.password,
			followers: user.followers.into_iter().map(Id::from).collect(),
			following: user.following.into_iter().map(Id::from).collect(),
		}
	}
}

impl From<&Comment> for CommentDocument {
	fn from(comment: &Comment) -> Self {
		Self {
			id: comment.id.into_inner(),
			from: comment.from.into_inner(),
			content: comment.content.clone(),
		}
	}
}

impl From<CommentDocument> for Comment {
	fn from(comment: CommentDocument) -> Self {
		Self {
			id: comment.id.into(),
			from: comment.from.into(),
			content: comment.content,
		}
	}
}

impl From<&Post> for PostDocument {
	fn from(post: &Post) -> Self {
		Self {
			id: post.id.into_inner(),
			from: post.from.into_inner(),
			message: post.message.clone(),
			likes: post.likes,
			liked_by: ids(&post.liked_by),
			comments: post.comments.iter().map(CommentDocument::from).collect(),
		}
	}
}

impl From<PostDocument> for Post {
	fn from(post: PostDocument) -> Self {
		Self {
			id: post.id.into(),
			from: post.from.into(),
			message: post.message,
			likes: post.likes,
			liked_by: post.liked_by.into_iter().map(Id::from).collect(),
			comments: post.comments.into_iter().map(Comment::from).collect(),
		}
	}
}

/// Maps a unique index violation on insert to the field that collided.
fn duplicate_field(error: &mongodb::error::Error) -> Option<UniqueField> {
	let ErrorKind::Write(WriteFailure::WriteError(ref write)) = *error.kind else {
		return None;
	};

	if write.code != DUPLICATE_KEY {
		return None;
	}

	Some(colliding_field(&write.message))
}

/// Reads the violated index out of a duplicate key error message.
fn colliding_field(message: &str) -> UniqueField {
	if message.contains(EMAIL_INDEX) {
		UniqueField::Email
	} else {
		UniqueField::Username
	}
}

fn return_updated() -> FindOneAndUpdateOptions {
	FindOneAndUpdateOptions::builder()
		.return_document(ReturnDocument::After)
		.build()
}

/// A MongoDB-backed store.
///
/// The client holds its own connection pool, so a single instance is
/// created at startup and shared by every request.
#[derive(Clone, Debug)]
pub struct MongoStore {
	users: Collection<UserDocument>,
	posts: Collection<PostDocument>,
}

impl MongoStore {
	/// Connects to the server and ensures the unique indexes exist.
	pub async fn connect(config: &StoreConfig) -> Result<Self, Error> {
		let client = Client::with_uri_str(config.uri()).await?;
		let database = client.database(&config.name);

		let users = database.collection::<UserDocument>(&config.users_collection);
		let posts = database.collection::<PostDocument>(&config.posts_collection);

		let unique = || IndexOptions::builder().unique(true).build();

		users
			.create_indexes(
				[
					IndexModel::builder()
						.keys(doc! { "username": 1 })
						.options(unique())
						.build(),
					IndexModel::builder()
						.keys(doc! { "email": 1 })
						.options(unique())
						.build(),
				],
				None,
			)
			.await?;

		posts
			.create_index(IndexModel::builder().keys(doc! { "from": 1 }).build(), None)
			.await?;

		tracing::info!(database = %config.name, "connected to mongodb");

		Ok(Self { users, posts })
	}

	async fn update_user_set(&self, user: Id, update: Document) -> Result<bool, Error> {
		let result = self
			.users
			.update_one(doc! { "_id": user.into_inner() }, update, None)
			.await?;

		Ok(result.matched_count > 0)
	}

	async fn find_and_update_post(
		&self,
		filter: Document,
		update: Document,
	) -> Result<Option<Post>, Error> {
		Ok(self
			.posts
			.find_one_and_update(filter, update, return_updated())
			.await?
			.map(Post::from))
	}
}

#[async_trait]
impl Store for MongoStore {
	async fn insert_user(&self, user: &User) -> Result<(), Error> {
		self.users
			.insert_one(UserDocument::from(user), None)
			.await
			.map_err(|e| duplicate_field(&e).map_or(Error::Mongo(e), Error::Duplicate))?;

		Ok(())
	}

	async fn find_user(&self, id: Id) -> Result<Option<User>, Error> {
		Ok(self
			.users
			.find_one(doc! { "_id": id.into_inner() }, None)
			.await?
			.map(User::from))
	}

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
		Ok(self
			.users
			.find_one(doc! { "username": username }, None)
			.await?
			.map(User::from))
	}

	async fn find_user_by_identity(&self, username: &str, email: &str) -> Result<Option<User>, Error> {
		Ok(self
			.users
			.find_one(
				doc! { "$or": [{ "username": username }, { "email": email }] },
				None,
			)
			.await?
			.map(User::from))
	}

	async fn find_users(&self, users: &[Id]) -> Result<Vec<User>, Error> {
		let cursor = self
			.users
			.find(doc! { "_id": { "$in": ids(users) } }, None)
			.await?;

		Ok(cursor.map_ok(User::from).try_collect().await?)
	}

	async fn add_edge(&self, user: Id, edge: Edge, other: Id) -> Result<bool, Error> {
		let mut set = Document::new();
		set.insert(edge.field(), other.into_inner());

		self.update_user_set(user, doc! { "$addToSet": set }).await
	}

	async fn remove_edge(&self, user: Id, edge: Edge, other: Id) -> Result<bool, Error> {
		let mut set = Document::new();
		set.insert(edge.field(), other.into_inner());

		self.update_user_set(user, doc! { "$pull": set }).await
	}

	async fn insert_post(&self, post: &Post) -> Result<(), Error> {
		self.posts.insert_one(PostDocument::from(post), None).await?;
		Ok(())
	}

	async fn find_post(&self, id: Id) -> Result<Option<Post>, Error> {
		Ok(self
			.posts
			.find_one(doc! { "_id": id.into_inner() }, None)
			.await?
			.map(Post::from))
	}

	async fn find_posts_by_authors(&self, authors: &[Id]) -> Result<Vec<Post>, Error> {
		let cursor = self
			.posts
			.find(doc! { "from": { "$in": ids(authors) } }, None)
			.await?;

		Ok(cursor.map_ok(Post::from).try_collect().await?)
	}

	async fn update_post(&self, id: Id, author: Id, patch: &UpdatePost) -> Result<Option<Post>, Error> {
		let filter = doc! { "_id": id.into_inner(), "from": author.into_inner() };
		if patch.is_empty() {
			return Ok(self.posts.find_one(filter, None).await?.map(Post::from));
		}

		let mut set = Document::new();

		if let Some(message) = &patch.message {
			set.insert("message", message.clone());
		}

		self.find_and_update_post(filter, doc! { "$set": set }).await
	}

	async fn delete_post(&self, id: Id, author: Id) -> Result<u64, Error> {
		let result = self
			.posts
			.delete_one(
				doc! { "_id": id.into_inner(), "from": author.into_inner() },
				None,
			)
			.await?;

		Ok(result.deleted_count)
	}

	async fn like_post(&self, id: Id, user: Id) -> Result<Option<Post>, Error> {
		let user = user.into_inner();

		self.find_and_update_post(
			doc! { "_id": id.into_inner(), "likedBy": { "$ne": user } },
			doc! { "$addToSet": { "likedBy": user }, "$inc": { "likes": 1_i64 } },
		)
		.await
	}

	async fn unlike_post(&self, id: Id, user: Id) -> Result<Option<Post>, Error> {
		let user = user.into_inner();

		self.find_and_update_post(
			doc! { "_id": id.into_inner(), "likedBy": user },
			doc! { "$pull": { "likedBy": user }, "$inc": { "likes": -1_i64 } },
		)
		.await
	}

	async fn push_comment(&self, id: Id, comment: &Comment) -> Result<Option<Post>, Error> {
		let comment = CommentDocument::from(comment);

		self.find_and_update_post(
			doc! { "_id": id.into_inner() },
			doc! { "$push": { "comments": {
				"_id": comment.id,
				"from": comment.from,
				"content": comment.content,
			} } },
		)
		.await
	}

	async fn pull_comment(&self, id: Id, comment: Id) -> Result<Option<Post>, Error> {
		self.find_and_update_post(
			doc! { "_id": id.into_inner() },
			doc! { "$pull": { "comments": { "_id": comment.into_inner() } } },
		)
		.await
	}
}
