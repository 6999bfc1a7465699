//! Throwaway config directories for tests that read from disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Two venues quoting the same Super Bowl market.
pub const CATALOG: &str = r#"{"markets": [
  {"venue": "kalshi", "market_id": "KXSB-KC", "kind": "prediction",
   "title": "Will the Chiefs win Super Bowl LX?", "yes_instrument": "KXSB-KC"},
  {"venue": "book", "market_id": "sb-kc", "kind": "sportsbook",
   "title": "Will the Chiefs win Super Bowl LX?", "yes_instrument": "sb-kc:yes",
   "no_instrument": "sb-kc:no"}
]}"#;

/// A temp directory holding `crossbook.toml` with a file store under it.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_extra("")
    }

    /// Append raw TOML (extra sections) to the base config.
    pub fn with_extra(extra: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        fs::write(root.join("catalog.json"), CATALOG).expect("write catalog");
        let config = format!(
            r#"catalog = "{catalog}"

[[venues]]
id = "kalshi"
kind = "prediction"
codec = "kalshi"
ws_url = "wss://api.elections.kalshi.com/trade-api/ws/v2"
fee = "kalshi"
balance = 500

[[venues]]
id = "book"
kind = "sportsbook"
codec = "odds"
ws_url = "ws://localhost:9001/odds"

[store]
kind = "file"
path = "{kv}"

[journal]
dir = "{journal}"
{extra}"#,
            catalog = toml_path(&root.join("catalog.json")),
            kv = toml_path(&root.join("kv")),
            journal = toml_path(&root.join("journal")),
        );
        fs::write(root.join("crossbook.toml"), config).expect("write config");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("crossbook.toml")
    }

    pub fn kv_dir(&self) -> PathBuf {
        self.root().join("kv")
    }

    pub fn journal_dir(&self) -> PathBuf {
        self.root().join("journal")
    }

    /// Write a file relative to the workspace root.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join(name);
        fs::write(&path, content).expect("write file");
        path
    }
}

fn toml_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}
