use assert_cmd::Command;
use std::path::{Path, PathBuf};
use todo_sync::config::ConfigManager;
use todo_sync::{TodoItem, TodoList};

// Nothing listens on the discard port, so any remote call fails fast.
const UNREACHABLE_API: &str = "http://127.0.0.1:9/api";

struct TestEnv {
    temp_dir: tempfile::TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = tempfile::Builder::new()
            .prefix("todosync_cli")
            .tempdir()
            .expect("Failed to create temporary directory");

        let mut manager = ConfigManager::load(temp_dir.path().join("config.json"))
            .expect("Failed to create config manager");
        manager
            .set("cache.path", temp_dir.path().join("cache.json").to_str().unwrap())
            .expect("Failed to set cache.path");

        Self { temp_dir }
    }

    fn with_cached_lists(lists: &[TodoList]) -> Self {
        let env = Self::new();
        std::fs::write(env.cache_path(), serde_json::to_string(lists).unwrap()).unwrap();
        env
    }

    fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.json")
    }

    fn cache_path(&self) -> PathBuf {
        self.temp_dir.path().join("cache.json")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("todosync").unwrap();
        cmd.env("TODOSYNC_CONFIG", self.config_path())
            .env("TODOSYNC_API_URL", UNREACHABLE_API)
            .env_remove("RUST_LOG")
            .timeout(std::time::Duration::from_secs(10));
        cmd
    }

    fn cached_lists(&self) -> Vec<TodoList> {
        read_lists(&self.cache_path())
    }
}

fn read_lists(path: &Path) -> Vec<TodoList> {
    let contents = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&contents).unwrap()
}

fn groceries() -> Vec<TodoList> {
    vec![
        TodoList {
            id: 1,
            name: "Groceries".to_string(),
            items: vec![
                TodoItem {
                    id: 101,
                    name: "Milk".to_string(),
                    description: None,
                    done: false,
                },
                TodoItem {
                    id: 102,
                    name: "Bread".to_string(),
                    description: Some("sourdough".to_string()),
                    done: true,
                },
            ],
        },
        TodoList {
            id: 2,
            name: "Work".to_string(),
            items: Vec::new(),
        },
    ]
}

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

fn stderr_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stderr.clone()).unwrap()
}

#[test]
fn test_config_set_get_and_list() {
    let env = TestEnv::new();

    env.cmd()
        .args(["config", "set", "api.url", "https://todo.example.com/api"])
        .assert()
        .success();

    let output = stdout_of(env.cmd().args(["config", "get", "api.url"]).assert().success());
    assert_eq!(output.trim(), "https://todo.example.com/api");

    let output = stdout_of(env.cmd().args(["config", "list"]).assert().success());
    assert!(output.contains("api.url = http://localhost:4000/api (default)"));
    assert!(output.contains("api.url = https://todo.example.com/api"));
    assert!(output.contains("cache.type = json (default)"));
}

#[test]
fn test_config_rejects_unknown_key() {
    let env = TestEnv::new();
    let stderr = stderr_of(env.cmd().args(["config", "set", "theme", "dark"]).assert().failure());
    assert!(stderr.contains("Error: Invalid key: theme"));
}

#[test]
fn test_list_ls_reads_cache_without_remote() {
    let env = TestEnv::with_cached_lists(&groceries());

    let output = stdout_of(env.cmd().args(["list", "ls"]).assert().success());
    assert!(output.contains("[1] Groceries (1/2 done)"));
    assert!(output.contains("[2] Work (0/0 done)"));
}

#[test]
fn test_list_show_prints_items() {
    let env = TestEnv::with_cached_lists(&groceries());

    let output = stdout_of(env.cmd().args(["list", "show", "1"]).assert().success());
    assert!(output.contains("[ ] 101 Milk"));
    assert!(output.contains("[x] 102 Bread - sourdough"));

    let stderr = stderr_of(env.cmd().args(["list", "show", "9"]).assert().failure());
    assert!(stderr.contains("Error: Todo list 9 not found"));
}

#[test]
fn test_item_move_is_local_and_persisted() {
    let env = TestEnv::with_cached_lists(&groceries());

    env.cmd()
        .args(["item", "move", "1", "102", "1"])
        .assert()
        .success();

    let ids: Vec<u64> = env.cached_lists()[0].items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![102, 101]);
}

#[test]
fn test_item_move_keeps_every_item() {
    let env = TestEnv::with_cached_lists(&groceries());

    // A position past the end moves the item last.
    env.cmd()
        .args(["item", "move", "1", "101", "9"])
        .assert()
        .success();
    let ids: Vec<u64> = env.cached_lists()[0].items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![102, 101]);

    let stderr = stderr_of(env.cmd().args(["item", "move", "1", "555", "1"]).assert().failure());
    assert!(stderr.contains("Error: Todo item 555 not found in list 1"));
    assert_eq!(env.cached_lists()[0].items.len(), 2);
}

#[test]
fn test_list_show_filters_items() {
    let env = TestEnv::with_cached_lists(&groceries());

    let output = stdout_of(
        env.cmd()
            .args(["list", "show", "1", "--filter", "pending"])
            .assert()
            .success(),
    );
    assert!(output.contains("[1] Groceries (all 2, pending 1, done 1)"));
    assert!(output.contains("[ ] 101 Milk"));
    assert!(!output.contains("Bread"));

    let output = stdout_of(
        env.cmd()
            .args(["list", "show", "1", "--filter", "done"])
            .assert()
            .success(),
    );
    assert!(output.contains("[x] 102 Bread - sourdough"));
    assert!(!output.contains("Milk"));
}

#[test]
fn test_failed_delete_leaves_cache_untouched() {
    let env = TestEnv::with_cached_lists(&groceries());

    let stderr = stderr_of(env.cmd().args(["list", "delete", "1"]).assert().failure());
    assert!(stderr.contains("Error: Failed to delete todo list"));

    assert_eq!(env.cached_lists(), groceries());
}

#[test]
fn test_empty_cache_without_remote_fails() {
    let env = TestEnv::new();

    let stderr = stderr_of(env.cmd().args(["list", "ls"]).assert().failure());
    assert!(stderr.contains("Error: Failed to fetch todo lists"));
}

#[test]
fn test_item_edit_requires_a_field() {
    let env = TestEnv::with_cached_lists(&groceries());

    let stderr = stderr_of(env.cmd().args(["item", "edit", "1", "101"]).assert().failure());
    assert!(stderr.contains("Nothing to change"));
}
