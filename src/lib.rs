//! Keeps a collection of to-do lists in sync between a local cache and a
//! remote REST service, applying changes optimistically and rolling them back
//! when the service rejects them.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod models;
pub mod store;

pub use api::{ApiError, HttpTodoApi, TodoApi};
pub use cache::{Cache, CacheError, CacheType};
pub use models::{ItemPatch, NewItem, NewList, TodoItem, TodoList};
pub use store::{StoreState, SyncError, TodoStore};
