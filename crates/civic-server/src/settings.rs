//! Server settings, loaded from TOML and `CIVIC_*` environment variables.

use std::path::{Path, PathBuf};

use civic_core::entity::NewRole;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Rebuild every cached counter before serving.
  #[serde(default)]
  pub recount_on_startup: bool,
  /// Roles inserted when the store has none yet.
  #[serde(default)]
  pub seed_roles:         Vec<NewRole>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/civic/civic.db") }

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `CIVIC_`-prefixed
  /// environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CIVIC"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert!(!cfg.recount_on_startup);
    assert!(cfg.seed_roles.is_empty());
  }

  #[test]
  fn seed_roles_are_read() {
    let cfg = parse(
      r#"
        port = 9000
        recount_on_startup = true

        [[seed_roles]]
        title = "Resident"
        upvote_weight = 1

        [[seed_roles]]
        title = "Administrator"
        upvote_weight = 3
        is_admin = true
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert!(cfg.recount_on_startup);
    assert_eq!(cfg.seed_roles.len(), 2);
    assert!(!cfg.seed_roles[0].is_admin);
    assert!(cfg.seed_roles[1].is_admin);
    assert_eq!(cfg.seed_roles[1].upvote_weight, 3);
  }

  #[test]
  fn tilde_expands_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/civic.db")),
      PathBuf::from(home).join("civic.db")
    );
    assert_eq!(expand_tilde(Path::new("/tmp/civic.db")), PathBuf::from("/tmp/civic.db"));
  }
}
