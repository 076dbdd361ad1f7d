use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::CourierConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "courier.toml",
    "courier.yaml",
    "courier.yml",
    "courier.json",
];

/// Environment variables that override file values.
pub const ENV_ACCESS_TOKEN: &str = "COURIER_ACCESS_TOKEN";
pub const ENV_HOMESERVER: &str = "COURIER_HOMESERVER";
pub const ENV_ROOM_ID: &str = "COURIER_ROOM_ID";

/// Load config from `path` (format chosen by extension), with `${VAR}`
/// substitution applied to the raw text first.
pub fn load_config(path: &Path) -> anyhow::Result<CourierConfig> {
    let raw = read_substituted(path)?;
    parse_config(&raw, path)
}

/// Load the file as an untyped JSON tree, for validation.
pub fn load_config_value(path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = read_substituted(path)?;
    parse_config_value(&raw, path)
}

fn read_substituted(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(substitute_env(&raw))
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./courier.{toml,yaml,yml,json}`
/// 2. `<user config dir>/courier/courier.{toml,yaml,yml,json}`
///
/// Falls back to `CourierConfig::default()` when nothing is found or the
/// file fails to load.
pub fn discover_and_load() -> CourierConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    CourierConfig::default()
}

/// First existing config file in the standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// User-global config directory, e.g. `~/.config/courier/`.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "courier").map(|d| d.config_dir().to_path_buf())
}

/// Apply `COURIER_*` environment overrides on top of file values.
#[must_use]
pub fn apply_env_overrides(config: CourierConfig) -> CourierConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: CourierConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> CourierConfig {
    let set = |name: &str| lookup(name).filter(|v| !v.is_empty());
    if let Some(token) = set(ENV_ACCESS_TOKEN) {
        config.matrix.access_token = Secret::new(token);
    }
    if let Some(homeserver) = set(ENV_HOMESERVER) {
        config.matrix.homeserver = homeserver;
    }
    if let Some(room_id) = set(ENV_ROOM_ID) {
        config.matrix.room_id = Some(room_id);
    }
    config
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<CourierConfig> {
    match extension(path) {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        ext => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

fn parse_config_value(raw: &str, path: &Path) -> anyhow::Result<serde_json::Value> {
    match extension(path) {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        ext => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
