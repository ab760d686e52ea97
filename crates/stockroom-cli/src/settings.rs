//! Layered configuration: TOML file, then `STOCKROOM_*` environment
//! variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8081/v1/graphql";
pub const ENV_PREFIX: &str = "STOCKROOM";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
  #[serde(default = "default_endpoint")]
  pub endpoint:                  String,
  #[serde(default)]
  pub admin_secret:              Option<String>,
  #[serde(default = "default_storage_path")]
  pub storage_path:              PathBuf,
  #[serde(default = "default_timeout")]
  pub request_timeout_secs:      u64,
  #[serde(default)]
  pub log_file:                  Option<PathBuf>,
  /// Accept stored passwords that are not argon2 hashes.
  #[serde(default)]
  pub allow_plaintext_passwords: bool,
}

fn default_endpoint() -> String { DEFAULT_ENDPOINT.to_string() }

fn default_storage_path() -> PathBuf { PathBuf::from("~/.local/share/stockroom/client.db") }

fn default_timeout() -> u64 { 30 }

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Default)]
pub struct Overrides {
  pub endpoint:     Option<String>,
  pub admin_secret: Option<String>,
  pub storage_path: Option<PathBuf>,
  pub log_file:     Option<PathBuf>,
}

impl Settings {
  pub fn load(file: &Path, overrides: Overrides) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .set_override_option("endpoint", overrides.endpoint)?
      .set_override_option("admin_secret", overrides.admin_secret)?
      .set_override_option(
        "storage_path",
        overrides.storage_path.map(|p| p.to_string_lossy().into_owned()),
      )?
      .set_override_option(
        "log_file",
        overrides.log_file.map(|p| p.to_string_lossy().into_owned()),
      )?
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.storage_path = expand_tilde(&settings.storage_path);
    settings.log_file = settings.log_file.as_deref().map(expand_tilde);
    Ok(settings)
  }
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

  fn write_config(name: &str, body: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stockroom-settings-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("stockroom.toml");
    std::fs::write(&path, body).unwrap();
    path
  }

  #[test]
  fn missing_file_gives_defaults() {
    let s = Settings::load(Path::new("/nonexistent/stockroom.toml"), Overrides::default())
      .unwrap();
    assert_eq!(s.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(s.request_timeout_secs, 30);
    assert!(!s.allow_plaintext_passwords);
    assert!(s.admin_secret.is_none());
  }

  #[test]
  fn flags_override_file() {
    let path = write_config(
      "override",
      r#"
        endpoint = "http://hasura.internal/v1/graphql"
        storage_path = "/var/lib/stockroom/client.db"
        allow_plaintext_passwords = true
        request_timeout_secs = 5
      "#,
    );
    let s = Settings::load(&path, Overrides {
      endpoint: Some("http://localhost:9999/v1/graphql".into()),
      ..Default::default()
    })
    .unwrap();

    assert_eq!(s.endpoint, "http://localhost:9999/v1/graphql");
    assert_eq!(s.storage_path, PathBuf::from("/var/lib/stockroom/client.db"));
    assert_eq!(s.request_timeout_secs, 5);
    assert!(s.allow_plaintext_passwords);
  }

  #[test]
  fn tilde_expansion() {
    let expanded = expand_tilde(Path::new("/abs/path"));
    assert_eq!(expanded, PathBuf::from("/abs/path"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    }
  }
}
