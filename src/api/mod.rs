//! Client side of the remote to-do service.
//!
//! The service exposes CRUD endpoints for lists and their items. [`TodoApi`] is
//! the seam the store talks to; [`HttpTodoApi`] is the REST/JSON implementation.

use crate::models::{ItemPatch, NewItem, NewList, TodoItem, TodoList};
use async_trait::async_trait;
use thiserror::Error;

pub mod http;

pub use http::HttpTodoApi;

pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to {operation}: {status} {status_text}")]
    Status {
        operation: &'static str,
        status: u16,
        status_text: String,
    },
    #[error("Failed to {operation}: invalid response body: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status of the failed call, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Operations offered by the remote to-do service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn get_todo_lists(&self) -> Result<Vec<TodoList>, ApiError>;

    async fn get_todo_list(&self, id: u64) -> Result<TodoList, ApiError>;

    async fn create_todo_list(&self, data: &NewList) -> Result<TodoList, ApiError>;

    async fn update_todo_list(&self, id: u64, name: &str) -> Result<TodoList, ApiError>;

    async fn delete_todo_list(&self, id: u64) -> Result<(), ApiError>;

    async fn create_todo_item(&self, list_id: u64, data: &NewItem) -> Result<TodoItem, ApiError>;

    async fn update_todo_item(
        &self,
        list_id: u64,
        item_id: u64,
        data: &ItemPatch,
    ) -> Result<TodoItem, ApiError>;

    async fn delete_todo_item(&self, list_id: u64, item_id: u64) -> Result<(), ApiError>;
}
