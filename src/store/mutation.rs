use crate::api::{ApiError, TodoApi};
use crate::models::{ItemPatch, TodoList};

/// A change that is applied locally before the remote service confirms it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Mutation {
    DeleteList { id: u64 },
    RenameList { id: u64, name: String },
    UpdateItem { list_id: u64, item_id: u64, patch: ItemPatch },
    DeleteItem { list_id: u64, item_id: u64 },
}

impl Mutation {
    pub(crate) fn apply(&self, lists: &mut Vec<TodoList>) {
        match self {
            Mutation::DeleteList { id } => lists.retain(|l| l.id != *id),
            Mutation::RenameList { id, name } => {
                if let Some(list) = lists.iter_mut().find(|l| l.id == *id) {
                    list.name = name.clone();
                }
            }
            Mutation::UpdateItem {
                list_id,
                item_id,
                patch,
            } => {
                if let Some(item) = lists
                    .iter_mut()
                    .find(|l| l.id == *list_id)
                    .and_then(|l| l.item_mut(*item_id))
                {
                    item.apply(patch);
                }
            }
            Mutation::DeleteItem { list_id, item_id } => {
                if let Some(list) = lists.iter_mut().find(|l| l.id == *list_id) {
                    list.remove_item(*item_id);
                }
            }
        }
    }

    /// Issues the remote call that confirms this change.
    pub(crate) async fn confirm(&self, api: &dyn TodoApi) -> Result<(), ApiError> {
        match self {
            Mutation::DeleteList { id } => api.delete_todo_list(*id).await,
            Mutation::RenameList { id, name } => api.update_todo_list(*id, name).await.map(|_| ()),
            Mutation::UpdateItem {
                list_id,
                item_id,
                patch,
            } => api
                .update_todo_item(*list_id, *item_id, patch)
                .await
                .map(|_| ()),
            Mutation::DeleteItem { list_id, item_id } => {
                api.delete_todo_item(*list_id, *item_id).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_utils::sample_lists;

    #[test]
    fn test_apply_to_missing_targets_is_a_no_op() {
        let mut lists = sample_lists();
        Mutation::RenameList {
            id: 42,
            name: "Nope".to_string(),
        }
        .apply(&mut lists);
        Mutation::DeleteItem {
            list_id: 2,
            item_id: 101,
        }
        .apply(&mut lists);
        assert_eq!(lists, sample_lists());
    }

    #[test]
    fn test_apply_update_item() {
        let mut lists = sample_lists();
        Mutation::UpdateItem {
            list_id: 1,
            item_id: 101,
            patch: ItemPatch::done(true),
        }
        .apply(&mut lists);
        assert!(lists[0].items[0].done);
        assert_eq!(lists[1], sample_lists()[1]);
    }
}
