//! In-process store. Backs the tests and `TODOCRUD_STORE=memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, TodoStore};
use crate::todo::{self, NewTodo, Todo, TodoChanges, TodoId};

/// A `HashMap` behind a tokio `RwLock`.
///
/// Title uniqueness is checked under the write lock, so it holds under
/// concurrent inserts the same way MongoDB's unique index does.
#[derive(Default)]
pub struct MemoryStore {
    todos: RwLock<HashMap<TodoId, Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.todos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.todos.read().await.is_empty()
    }
}

fn title_taken(todos: &HashMap<TodoId, Todo>, title: &str, except: Option<TodoId>) -> bool {
    todos.values().any(|t| t.title == title && Some(t.id) != except)
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn find_by_title(&self, title: &str) -> Result<Option<Todo>, StoreError> {
        let todos = self.todos.read().await;
        Ok(todos.values().find(|t| t.title == title).cloned())
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        Ok(self.todos.read().await.get(&id).cloned())
    }

    async fn insert(&self, new: NewTodo) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;
        if title_taken(&todos, &new.title, None) {
            return Err(StoreError::DuplicateTitle(new.title));
        }

        let now = todo::now();
        let todo = Todo {
            id: TodoId::new(),
            title: new.title,
            subtitle: new.subtitle,
            created_at: now,
            updated_at: now,
        };
        todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn update_by_id(&self, id: TodoId, changes: TodoChanges) -> Result<Option<Todo>, StoreError> {
        let mut todos = self.todos.write().await;
        if let Some(title) = &changes.title
            && todos.contains_key(&id)
            && title_taken(&todos, title, Some(id))
        {
            return Err(StoreError::DuplicateTitle(title.clone()));
        }

        let Some(todo) = todos.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(todo, todo::now());
        Ok(Some(todo.clone()))
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        Ok(self.todos.write().await.remove(&id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
