use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub done: bool,
}

impl TodoItem {
    /// Merges the fields present in `patch` into this item.
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(ref description) = patch.description {
            self.description = Some(description.clone());
        }
        if let Some(done) = patch.done {
            self.done = done;
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TodoList {
    pub id: u64,
    pub name: String,
    #[serde(rename = "todoItems", default)]
    pub items: Vec<TodoItem>,
}

impl TodoList {
    pub fn item(&self, item_id: u64) -> Option<&TodoItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: u64) -> Option<&mut TodoItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    pub fn remove_item(&mut self, item_id: u64) {
        self.items.retain(|i| i.id != item_id);
    }

    /// Rebuilds `items` in the order given by `ordered_ids`.
    ///
    /// Ids that do not belong to this list are skipped, and items whose ids are
    /// not named are dropped.
    pub fn reorder_items(&mut self, ordered_ids: &[u64]) {
        let mut remaining = std::mem::take(&mut self.items);
        let mut reordered = Vec::with_capacity(ordered_ids.len().min(remaining.len()));
        for id in ordered_ids {
            if let Some(pos) = remaining.iter().position(|i| i.id == *id) {
                reordered.push(remaining.swap_remove(pos));
            }
        }
        self.items = reordered;
    }

    pub fn done_count(&self) -> usize {
        self.items.iter().filter(|i| i.done).count()
    }

    pub fn pending_count(&self) -> usize {
        self.items.len() - self.done_count()
    }

    pub fn filtered_items(&self, filter: ItemFilter) -> impl Iterator<Item = &TodoItem> {
        self.items.iter().filter(move |i| filter.matches(i))
    }

    /// Item ids in their current order, with `item_id` moved to `position`.
    ///
    /// Positions past the end move the item last. Returns `None` when the item
    /// is not in this list.
    pub fn order_with_move(&self, item_id: u64, position: usize) -> Option<Vec<u64>> {
        let mut ids: Vec<u64> = self.items.iter().map(|i| i.id).collect();
        let from = ids.iter().position(|id| *id == item_id)?;
        let moved = ids.remove(from);
        ids.insert(position.min(ids.len()), moved);
        Some(ids)
    }
}

/// Which items of a list to show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ItemFilter {
    #[default]
    All,
    Pending,
    Done,
}

impl ItemFilter {
    pub fn matches(self, item: &TodoItem) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Pending => !item.done,
            ItemFilter::Done => item.done,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewList {
    pub name: String,
}

impl NewList {
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        Self { name: name.into() }.normalized()
    }

    /// Trims the name, rejecting it if nothing is left.
    pub fn normalized(self) -> Result<Self, ModelError> {
        Ok(Self {
            name: normalize_name(&self.name)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Result<Self, ModelError> {
        Self {
            name: name.into(),
            description,
        }
        .normalized()
    }

    /// Trims name and description; a blank description is dropped.
    pub fn normalized(self) -> Result<Self, ModelError> {
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(Self {
            name: normalize_name(&self.name)?,
            description,
        })
    }
}

/// Partial update for an item; absent fields are left untouched.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl ItemPatch {
    pub fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.done.is_none()
    }

    /// Trims name and description. A blank description is kept as `""`,
    /// which clears it.
    pub fn normalized(self) -> Result<Self, ModelError> {
        let name = match self.name {
            Some(name) => Some(normalize_name(&name)?),
            None => None,
        };
        Ok(Self {
            name,
            description: self.description.map(|d| d.trim().to_string()),
            done: self.done,
        })
    }
}

/// Returns the trimmed name, or [`ModelError::EmptyName`] if it is blank.
pub fn normalize_name(name: &str) -> Result<String, ModelError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ModelError::EmptyName);
    }
    Ok(name.to_string())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Name cannot be empty")]
    EmptyName,
}
