//! MongoDB-backed store.
//!
//! Records live in the `todos` collection of the configured database. A
//! unique index on `title` is created at connect time; a write that would
//! break it fails with server error code 11000, which surfaces here as
//! [`StoreError::DuplicateTitle`].

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{StoreError, TodoStore};
use crate::config::StoreConfig;
use crate::todo::{self, NewTodo, Todo, TodoChanges, TodoId};

const COLLECTION: &str = "todos";
const TITLE_INDEX: &str = "title_unique";
const DUPLICATE_KEY: i32 = 11000;

/// The stored shape of a todo.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    subtitle: String,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl From<TodoDocument> for Todo {
    fn from(doc: TodoDocument) -> Self {
        Todo {
            id: doc.id.into(),
            title: doc.title,
            subtitle: doc.subtitle,
            created_at: to_chrono(doc.created_at),
            updated_at: to_chrono(doc.updated_at),
        }
    }
}

impl From<&Todo> for TodoDocument {
    fn from(todo: &Todo) -> Self {
        TodoDocument {
            id: todo.id.as_object_id(),
            title: todo.title.clone(),
            subtitle: todo.subtitle.clone(),
            created_at: to_bson(todo.created_at),
            updated_at: to_bson(todo.updated_at),
        }
    }
}

fn to_chrono(at: bson::DateTime) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or_default()
}

fn to_bson(at: chrono::DateTime<chrono::Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn by_id(id: TodoId) -> Document {
    doc! { "_id": id.as_object_id() }
}

/// The `$set` stage of an update pipeline: the present fields plus
/// `updatedAt`, which never lands on or before its stored value.
///
/// Pipeline strings starting with `$` are field paths, so values go through
/// `$literal`.
fn set_document(changes: &TodoChanges, now: bson::DateTime) -> Document {
    let mut set = doc! {
        "updatedAt": { "$max": [now, { "$add": ["$updatedAt", 1] }] },
    };
    if let Some(title) = &changes.title {
        set.insert("title", doc! { "$literal": title.as_str() });
    }
    if let Some(subtitle) = &changes.subtitle {
        set.insert("subtitle", doc! { "$literal": subtitle.as_str() });
    }
    set
}

fn update_pipeline(changes: &TodoChanges, now: bson::DateTime) -> Vec<Document> {
    vec![doc! { "$set": set_document(changes, now) }]
}

/// The process's handle on MongoDB. Cheap to share: the driver pools
/// connections internally.
pub struct MongoStore {
    db: Database,
    todos: Collection<TodoDocument>,
}

impl MongoStore {
    /// Connects, pings, and ensures the title index.
    ///
    /// Any failure is returned; there is no retry. Call once at startup.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_owned());
        options.server_selection_timeout = Some(config.server_selection_timeout);

        let client = Client::with_options(options)?;
        let db = client.database(&config.database);
        let todos = db.collection::<TodoDocument>(COLLECTION);
        let store = Self { db, todos };

        store.ping().await?;
        store.ensure_title_index().await?;

        info!(database = %config.database, collection = COLLECTION, "database connected");
        Ok(store)
    }

    async fn ensure_title_index(&self) -> Result<(), StoreError> {
        let mut options = IndexOptions::default();
        options.name = Some(TITLE_INDEX.to_owned());
        options.unique = Some(true);

        let index = IndexModel::builder()
            .keys(doc! { "title": 1 })
            .options(options)
            .build();
        self.todos.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl TodoStore for MongoStore {
    async fn find_by_title(&self, title: &str) -> Result<Option<Todo>, StoreError> {
        let found = self.todos.find_one(doc! { "title": title }).await?;
        Ok(found.map(Todo::from))
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let found = self.todos.find_one(by_id(id)).await?;
        Ok(found.map(Todo::from))
    }

    async fn insert(&self, new: NewTodo) -> Result<Todo, StoreError> {
        let now = todo::now();
        let todo = Todo {
            id: TodoId::new(),
            title: new.title,
            subtitle: new.subtitle,
            created_at: now,
            updated_at: now,
        };

        match self.todos.insert_one(TodoDocument::from(&todo)).await {
            Ok(_) => Ok(todo),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::DuplicateTitle(todo.title)),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_by_id(&self, id: TodoId, changes: TodoChanges) -> Result<Option<Todo>, StoreError> {
        let update = update_pipeline(&changes, to_bson(todo::now()));
        let result = self
            .todos
            .find_one_and_update(by_id(id), update)
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(found) => Ok(found.map(Todo::from)),
            Err(e) if is_duplicate_key(&e) => {
                Err(StoreError::DuplicateTitle(changes.title.unwrap_or_default()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let removed = self.todos.find_one_and_delete(by_id(id)).await?;
        Ok(removed.map(Todo::from))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
