//! API key lookup: a local `secret.json` first, then `secrets.toml` in the
//! application config directory.

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::constants;

/// Default location of the local secret file, relative to the working directory.
pub const LOCAL_SECRET_FILE: &str = "secret.json";

#[derive(Deserialize)]
struct SecretFile {
  apikey: String,
}

/// Both secret formats carry a single `apikey` field.
fn read_key(path: &Path, parse: impl FnOnce(&str) -> Result<SecretFile>) -> Result<Option<String>> {
  if !path.exists() {
    return Ok(None);
  }
  let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let secret = parse(&content).with_context(|| format!("{} has no usable `apikey` field", path.display()))?;
  let key = secret.apikey.trim().to_string();
  if key.is_empty() {
    return Err(anyhow!("{} has an empty `apikey`", path.display()));
  }
  Ok(Some(key))
}

fn read_json(path: &Path) -> Result<Option<String>> {
  read_key(path, |s| serde_json::from_str(s).map_err(Into::into))
}

fn read_toml(path: &Path) -> Result<Option<String>> {
  read_key(path, |s| toml::from_str(s).map_err(Into::into))
}

/// `secrets.toml` inside the per-user config directory, if one can be resolved.
pub fn secret_store_path() -> Option<PathBuf> {
  ProjectDirs::from("", "", &constants().app_name).map(|dirs| dirs.config_dir().join("secrets.toml"))
}

/// Resolve the API key, checking `local` before `store`.
pub fn load_api_key_from(local: &Path, store: Option<&Path>) -> Result<String> {
  if let Some(key) = read_json(local)? {
    info!(path = %local.display(), "credentials: using local secret file");
    return Ok(key);
  }
  if let Some(store) = store
    && let Some(key) = read_toml(store)?
  {
    info!(path = %store.display(), "credentials: using secret store");
    return Ok(key);
  }
  let store_hint = store.map(|p| p.display().to_string()).unwrap_or_else(|| "<config dir>/secrets.toml".to_string());
  Err(anyhow!(
    "No YouTube API key found. Create {} with {{\"apikey\": \"...\"}} or {} with apikey = \"...\"",
    local.display(),
    store_hint
  ))
}

/// Resolve the API key from the default locations, or `local_override` if given.
pub fn load_api_key(local_override: Option<&Path>) -> Result<String> {
  let local = local_override.unwrap_or_else(|| Path::new(LOCAL_SECRET_FILE));
  let store = secret_store_path();
  load_api_key_from(local, store.as_deref())
}
