use super::{ApiError, TodoApi};
use crate::models::{ItemPatch, NewItem, NewList, TodoItem, TodoList};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

pub struct HttpTodoApi {
    client: Client,
    base_url: String,
}

impl HttpTodoApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{base_url}: scheme must be http or https"
            )));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    #[cfg(test)]
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, ApiError> {
        debug!(operation, path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        decode(operation, check(operation, response)?).await
    }

    async fn send_json<B, T>(
        &self,
        operation: &'static str,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(operation, path, %method, "sending");
        let response = self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        decode(operation, check(operation, response)?).await
    }

    async fn delete(&self, operation: &'static str, path: &str) -> Result<(), ApiError> {
        debug!(operation, path, "DELETE");
        let response = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        check(operation, response)?;
        Ok(())
    }
}

fn check(operation: &'static str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(ApiError::Status {
        operation,
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
    })
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, ApiError> {
    let body = response
        .text()
        .await
        .map_err(|source| ApiError::Transport { operation, source })?;
    serde_json::from_str(&body).map_err(|source| ApiError::Decode { operation, source })
}

#[async_trait]
impl TodoApi for HttpTodoApi {
    async fn get_todo_lists(&self) -> Result<Vec<TodoList>, ApiError> {
        self.get("fetch todo lists", "/todo-lists").await
    }

    async fn get_todo_list(&self, id: u64) -> Result<TodoList, ApiError> {
        self.get("fetch todo list", &format!("/todo-lists/{id}")).await
    }

    async fn create_todo_list(&self, data: &NewList) -> Result<TodoList, ApiError> {
        self.send_json("create todo list", reqwest::Method::POST, "/todo-lists", data)
            .await
    }

    async fn update_todo_list(&self, id: u64, name: &str) -> Result<TodoList, ApiError> {
        let body = NewList {
            name: name.to_string(),
        };
        self.send_json(
            "update todo list",
            reqwest::Method::PUT,
            &format!("/todo-lists/{id}"),
            &body,
        )
        .await
    }

    async fn delete_todo_list(&self, id: u64) -> Result<(), ApiError> {
        self.delete("delete todo list", &format!("/todo-lists/{id}")).await
    }

    async fn create_todo_item(&self, list_id: u64, data: &NewItem) -> Result<TodoItem, ApiError> {
        self.send_json(
            "create todo item",
            reqwest::Method::POST,
            &format!("/todo-lists/{list_id}/todo-items"),
            data,
        )
        .await
    }

    async fn update_todo_item(
        &self,
        list_id: u64,
        item_id: u64,
        data: &ItemPatch,
    ) -> Result<TodoItem, ApiError> {
        self.send_json(
            "update todo item",
            reqwest::Method::PUT,
            &format!("/todo-lists/{list_id}/todo-items/{item_id}"),
            data,
        )
        .await
    }

    async fn delete_todo_item(&self, list_id: u64, item_id: u64) -> Result<(), ApiError> {
        self.delete(
            "delete todo item",
            &format!("/todo-lists/{list_id}/todo-items/{item_id}"),
        )
        .await
    }
}
