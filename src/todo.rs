//! The todo record and the request payloads that create or change one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of a stored todo: a 12-byte ObjectId, rendered as 24 hex chars.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TodoId(ObjectId);

#[derive(Debug, Error)]
#[error("malformed todo id {0:?}")]
pub struct ParseTodoIdError(String);

impl TodoId {
    /// A fresh id. Ids are never reused.
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    pub fn as_object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for TodoId {
    fn default() -> Self { Self::new() }
}

impl From<ObjectId> for TodoId {
    fn from(oid: ObjectId) -> Self { Self(oid) }
}

impl FromStr for TodoId {
    type Err = ParseTodoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|_| ParseTodoIdError(s.to_owned()))
    }
}

impl TryFrom<String> for TodoId {
    type Error = ParseTodoIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TodoId> for String {
    fn from(id: TodoId) -> String {
        id.0.to_hex()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

/// A stored todo, as returned to clients.
///
/// ```json
/// {"_id":"65f1…","title":"Buy milk","subtitle":"2%",
///  "createdAt":"2024-03-13T09:00:00.123Z","updatedAt":"2024-03-13T09:00:00.123Z"}
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: TodoId,
    pub title: String,
    pub subtitle: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /create`. Missing fields read as empty strings.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
}

/// Body of `PUT /{id}`. Only the fields present are written.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

impl TodoChanges {
    /// Applies the present fields to `todo` and stamps `updated_at`.
    ///
    /// The new stamp is at least one millisecond past the old one, even when
    /// `now` falls in the same millisecond or the clock stepped back.
    pub fn apply(self, todo: &mut Todo, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(subtitle) = self.subtitle {
            todo.subtitle = subtitle;
        }
        todo.updated_at = now.max(todo.updated_at + chrono::Duration::milliseconds(1));
    }
}

/// Current time truncated to milliseconds, the precision MongoDB stores.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
