//! In-process state for the to-do lists.
//!
//! [`TodoStore`] owns the canonical copy of every list and item. It mirrors that
//! copy into a [`Cache`] and reconciles it with the remote service through a
//! [`TodoApi`]. Renames, item updates and deletions are applied locally first
//! and rolled back if the service rejects them; creations wait for the service
//! because it assigns the ids.
//!
//! Every failure is both returned to the caller and kept in [`TodoStore::error`]
//! until the next operation starts or [`TodoStore::clear_error`] is called.

use crate::api::{ApiError, TodoApi};
use crate::cache::Cache;
use crate::models::{ItemPatch, ModelError, NewItem, NewList, TodoItem, TodoList};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

mod mutation;

use mutation::Mutation;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Todo list {0} not found")]
    ListNotFound(u64),
    #[error("Todo item {item_id} not found in list {list_id}")]
    ItemNotFound { list_id: u64, item_id: u64 },
}

/// Snapshot published to subscribers after every state change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub lists: Vec<TodoList>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct TodoStore {
    api: Box<dyn TodoApi>,
    cache: Box<dyn Cache>,
    lists: Vec<TodoList>,
    loading: bool,
    error: Option<String>,
    initialized: bool,
    state_tx: watch::Sender<StoreState>,
}

impl TodoStore {
    pub fn new(api: Box<dyn TodoApi>, cache: Box<dyn Cache>) -> Self {
        let (state_tx, _) = watch::channel(StoreState::default());
        Self {
            api,
            cache,
            lists: Vec::new(),
            loading: false,
            error: None,
            initialized: false,
            state_tx,
        }
    }

    pub fn lists(&self) -> &[TodoList] {
        &self.lists
    }

    pub fn list(&self, id: u64) -> Option<&TodoList> {
        self.lists.iter().find(|l| l.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> StoreState {
        StoreState {
            lists: self.lists.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state_tx.subscribe()
    }

    /// Loads the collection, preferring a non-empty cache over the remote service.
    pub async fn fetch_lists(&mut self) -> Result<(), SyncError> {
        self.loading = true;
        self.error = None;
        self.publish();

        let result = match self.cached_lists() {
            Some(lists) => {
                debug!(count = lists.len(), "loaded lists from cache");
                Ok(lists)
            }
            None => {
                debug!("cache empty, fetching lists from remote");
                self.api.get_todo_lists().await.map_err(SyncError::from)
            }
        };

        self.loading = false;
        self.initialized = true;
        match result {
            Ok(lists) => {
                self.set_lists(lists);
                Ok(())
            }
            Err(err) => {
                self.set_lists(Vec::new());
                self.fail(err)
            }
        }
    }

    /// Drops the cached snapshot and reloads everything from the remote service.
    pub async fn resync(&mut self) -> Result<(), SyncError> {
        if let Err(e) = self.cache.clear() {
            warn!(error = %e, "failed to clear cache");
        }
        self.initialized = false;
        self.lists.clear();
        self.fetch_lists().await
    }

    pub async fn create_list(&mut self, name: &str) -> Result<TodoList, SyncError> {
        self.start_action();
        let result = self.try_create_list(name).await;
        self.surface(result)
    }

    async fn try_create_list(&mut self, name: &str) -> Result<TodoList, SyncError> {
        let data = NewList::new(name)?;
        let list = self.api.create_todo_list(&data).await?;
        self.lists.push(list.clone());
        self.commit();
        Ok(list)
    }

    /// Replaces the local copy of one list with the remote one.
    pub async fn refresh_list(&mut self, id: u64) -> Result<TodoList, SyncError> {
        self.start_action();
        let result = self.try_refresh_list(id).await;
        self.surface(result)
    }

    async fn try_refresh_list(&mut self, id: u64) -> Result<TodoList, SyncError> {
        let list = self.api.get_todo_list(id).await?;
        match self.lists.iter_mut().find(|l| l.id == id) {
            Some(existing) => *existing = list.clone(),
            None => self.lists.push(list.clone()),
        }
        self.commit();
        Ok(list)
    }

    pub async fn delete_list(&mut self, id: u64) -> Result<(), SyncError> {
        self.optimistic(Mutation::DeleteList { id }).await
    }

    pub async fn update_list(&mut self, id: u64, name: &str) -> Result<(), SyncError> {
        let name = match NewList::new(name) {
            Ok(data) => data.name,
            Err(e) => {
                self.start_action();
                return self.fail(e.into());
            }
        };
        self.optimistic(Mutation::RenameList { id, name }).await
    }

    pub async fn add_item(&mut self, list_id: u64, data: NewItem) -> Result<TodoItem, SyncError> {
        self.start_action();
        let result = self.try_add_item(list_id, data).await;
        self.surface(result)
    }

    async fn try_add_item(&mut self, list_id: u64, data: NewItem) -> Result<TodoItem, SyncError> {
        let data = data.normalized()?;
        let pos = self.position(list_id)?;
        let item = self.api.create_todo_item(list_id, &data).await?;
        self.lists[pos].items.push(item.clone());
        self.commit();
        Ok(item)
    }

    pub async fn update_item(
        &mut self,
        list_id: u64,
        item_id: u64,
        patch: ItemPatch,
    ) -> Result<(), SyncError> {
        let patch = match patch.normalized() {
            Ok(patch) => patch,
            Err(e) => {
                self.start_action();
                return self.fail(e.into());
            }
        };
        self.optimistic(Mutation::UpdateItem {
            list_id,
            item_id,
            patch,
        })
        .await
    }

    /// Flips the `done` flag of an item.
    pub async fn toggle_item(&mut self, list_id: u64, item_id: u64) -> Result<bool, SyncError> {
        let done = self
            .list(list_id)
            .ok_or(SyncError::ListNotFound(list_id))
            .and_then(|l| {
                l.item(item_id)
                    .map(|i| i.done)
                    .ok_or(SyncError::ItemNotFound { list_id, item_id })
            });
        let done = match done {
            Ok(done) => !done,
            Err(err) => {
                self.start_action();
                return self.fail(err);
            }
        };
        self.update_item(list_id, item_id, ItemPatch::done(done)).await?;
        Ok(done)
    }

    /// Reorders the items of a list locally; the remote service is not told.
    pub async fn update_item_positions(
        &mut self,
        list_id: u64,
        ordered_ids: &[u64],
    ) -> Result<(), SyncError> {
        self.start_action();
        let pos = match self.position(list_id) {
            Ok(pos) => pos,
            Err(err) => return self.fail(err),
        };
        self.lists[pos].reorder_items(ordered_ids);
        debug!(list_id, ?ordered_ids, "reordered items");
        self.commit();
        Ok(())
    }

    pub async fn delete_item(&mut self, list_id: u64, item_id: u64) -> Result<(), SyncError> {
        self.optimistic(Mutation::DeleteItem { list_id, item_id }).await
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.publish();
    }

    /// Applies `mutation` locally, confirms it remotely and restores the
    /// previous collection if the confirmation fails.
    async fn optimistic(&mut self, mutation: Mutation) -> Result<(), SyncError> {
        self.start_action();
        let snapshot = self.lists.clone();
        mutation.apply(&mut self.lists);
        self.commit();

        if let Err(err) = mutation.confirm(self.api.as_ref()).await {
            warn!(?mutation, error = %err, "remote rejected change, rolling back");
            self.set_lists(snapshot);
            return self.fail(err.into());
        }
        Ok(())
    }

    fn position(&self, list_id: u64) -> Result<usize, SyncError> {
        self.lists
            .iter()
            .position(|l| l.id == list_id)
            .ok_or(SyncError::ListNotFound(list_id))
    }

    fn cached_lists(&self) -> Option<Vec<TodoList>> {
        match self.cache.load() {
            Ok(Some(lists)) if !lists.is_empty() => Some(lists),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable cache");
                None
            }
        }
    }

    fn start_action(&mut self) {
        self.error = None;
    }

    fn surface<T>(&mut self, result: Result<T, SyncError>) -> Result<T, SyncError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => self.fail(err),
        }
    }

    fn fail<T>(&mut self, err: SyncError) -> Result<T, SyncError> {
        warn!(error = %err, "operation failed");
        self.error = Some(err.to_string());
        self.publish();
        Err(err)
    }

    fn set_lists(&mut self, lists: Vec<TodoList>) {
        self.lists = lists;
        self.commit();
    }

    /// Persists and publishes the current collection.
    fn commit(&mut self) {
        if self.initialized {
            if let Err(e) = self.cache.save(&self.lists) {
                warn!(error = %e, "failed to write cache");
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state());
    }
}
