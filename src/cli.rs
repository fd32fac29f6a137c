use crate::api::{ApiError, HttpTodoApi};
use crate::config::{ConfigError, ConfigManager};
use crate::models::{ItemFilter, ItemPatch, ModelError, NewItem, TodoList};
use crate::store::{SyncError, TodoStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "todosync", version, about = "To-do lists kept in sync with a remote service")]
pub struct Cli {
    /// Path to the config file (defaults to ~/.config/todosync/config.json)
    #[arg(long, global = true, env = "TODOSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage to-do lists
    List {
        #[command(subcommand)]
        command: ListCommand,
    },
    /// Manage items within a list
    Item {
        #[command(subcommand)]
        command: ItemCommand,
    },
    /// Drop the local cache and reload everything from the remote service
    Sync,
    /// Read or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// Show all lists
    Ls,
    /// Show one list with its items
    Show {
        id: u64,
        /// Fetch the list from the remote service first
        #[arg(long)]
        refresh: bool,
        /// Only show items in this state
        #[arg(long, value_enum, default_value_t = ItemFilter::All)]
        filter: ItemFilter,
    },
    /// Create a new list
    Create { name: String },
    /// Rename a list
    Rename { id: u64, name: String },
    /// Delete a list
    Delete { id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Add an item to a list
    Add {
        list_id: u64,
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change fields of an item
    Edit {
        list_id: u64,
        item_id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        done: Option<bool>,
    },
    /// Mark an item done, or not done if it already is
    Toggle { list_id: u64, item_id: u64 },
    /// Delete an item
    Delete { list_id: u64, item_id: u64 },
    /// Move an item to another position in its list (1 is the top)
    Move {
        list_id: u64,
        item_id: u64,
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        position: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Remove a configuration value, restoring its default
    Unset { key: String },
    /// Print all configuration values
    List,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Nothing to change: pass --name, --description or --done")]
    EmptyPatch,
    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let mut manager = ConfigManager::new(cli.config.as_deref())?;
    debug!(path = %manager.path().display(), "using config file");

    match cli.command {
        Commands::Config { command } => run_config(&mut manager, command),
        Commands::Sync => {
            let mut store = open_store(&manager)?;
            store.resync().await?;
            println!("Synced {} list(s) from {}", store.lists().len(), manager.api_url());
            Ok(())
        }
        Commands::List { command } => {
            let mut store = open_store(&manager)?;
            store.fetch_lists().await?;
            run_list(&mut store, command).await
        }
        Commands::Item { command } => {
            let mut store = open_store(&manager)?;
            store.fetch_lists().await?;
            run_item(&mut store, command).await
        }
    }
}

fn open_store(manager: &ConfigManager) -> Result<TodoStore, CliError> {
    let api = HttpTodoApi::new(&manager.api_url())?;
    let cache = manager.create_cache()?;
    Ok(TodoStore::new(Box::new(api), cache))
}

async fn run_list(store: &mut TodoStore, command: ListCommand) -> Result<(), CliError> {
    match command {
        ListCommand::Ls => {
            if store.lists().is_empty() {
                println!("No lists yet");
            }
            for list in store.lists() {
                println!("{}", format_list_line(list));
            }
        }
        ListCommand::Show {
            id,
            refresh,
            filter,
        } => {
            if refresh {
                store.refresh_list(id).await?;
            }
            let list = store.list(id).ok_or(SyncError::ListNotFound(id))?;
            print!("{}", format_list(list, filter));
        }
        ListCommand::Create { name } => {
            let list = store.create_list(&name).await?;
            println!("Created list {} ({})", list.name, list.id);
        }
        ListCommand::Rename { id, name } => {
            store.update_list(id, &name).await?;
            println!("Renamed list {} to {}", id, name);
        }
        ListCommand::Delete { id } => {
            store.delete_list(id).await?;
            println!("Deleted list {}", id);
        }
    }
    Ok(())
}

async fn run_item(store: &mut TodoStore, command: ItemCommand) -> Result<(), CliError> {
    match command {
        ItemCommand::Add {
            list_id,
            name,
            description,
        } => {
            let item = store.add_item(list_id, NewItem::new(name, description)?).await?;
            println!("Added item {} ({}) to list {}", item.name, item.id, list_id);
        }
        ItemCommand::Edit {
            list_id,
            item_id,
            name,
            description,
            done,
        } => {
            let patch = ItemPatch {
                name,
                description,
                done,
            };
            if patch.is_empty() {
                return Err(CliError::EmptyPatch);
            }
            store.update_item(list_id, item_id, patch).await?;
            println!("Updated item {} in list {}", item_id, list_id);
        }
        ItemCommand::Toggle { list_id, item_id } => {
            let done = store.toggle_item(list_id, item_id).await?;
            let state = if done { "done" } else { "not done" };
            println!("Marked item {} as {}", item_id, state);
        }
        ItemCommand::Delete { list_id, item_id } => {
            store.delete_item(list_id, item_id).await?;
            println!("Deleted item {} from list {}", item_id, list_id);
        }
        ItemCommand::Move {
            list_id,
            item_id,
            position,
        } => {
            let list = store.list(list_id).ok_or(SyncError::ListNotFound(list_id))?;
            let index = usize::try_from(position - 1).unwrap_or(usize::MAX);
            let ordered_ids = list
                .order_with_move(item_id, index)
                .ok_or(SyncError::ItemNotFound { list_id, item_id })?;
            store.update_item_positions(list_id, &ordered_ids).await?;
            let list = store.list(list_id).ok_or(SyncError::ListNotFound(list_id))?;
            print!("{}", format_list(list, ItemFilter::All));
        }
    }
    Ok(())
}

fn run_config(manager: &mut ConfigManager, command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Get { key } => match manager.get_or_default(&key) {
            Some(value) => println!("{}", value),
            None => return Err(CliError::UnknownKey(key)),
        },
        ConfigCommand::Set { key, value } => {
            manager.set(&key, &value)?;
            println!("Set {} = {}", key, value);
        }
        ConfigCommand::Unset { key } => {
            manager.unset(&key)?;
            println!("Unset {}", key);
        }
        ConfigCommand::List => {
            for (key, value, is_default) in manager.list() {
                if is_default {
                    println!("{} = {} (default)", key, value);
                } else {
                    println!("{} = {}", key, value);
                }
            }
        }
    }
    Ok(())
}

fn format_list_line(list: &TodoList) -> String {
    format!(
        "[{}] {} ({}/{} done)",
        list.id,
        list.name,
        list.done_count(),
        list.items.len()
    )
}

fn format_list(list: &TodoList, filter: ItemFilter) -> String {
    let mut out = format!(
        "[{}] {} (all {}, pending {}, done {})\n",
        list.id,
        list.name,
        list.items.len(),
        list.pending_count(),
        list.done_count()
    );
    for item in list.filtered_items(filter) {
        let mark = if item.done { "x" } else { " " };
        out.push_str(&format!("  [{}] {} {}", mark, item.id, item.name));
        if let Some(ref description) = item.description {
            out.push_str(&format!(" - {}", description));
        }
        out.push('\n');
    }
    out
}
