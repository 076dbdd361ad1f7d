//! Configuration loading, env substitution and validation.
//!
//! Config files: `courier.toml`, `courier.yaml`, `courier.yml` or
//! `courier.json`, searched in `./` then the user config directory.
//!
//! `${ENV_VAR}` placeholders are expanded before parsing, and `COURIER_*`
//! variables override the loaded values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        ENV_ACCESS_TOKEN, ENV_HOMESERVER, ENV_ROOM_ID, apply_env_overrides, config_dir,
        discover_and_load, find_config_file, load_config,
    },
    schema::{CourierConfig, MatrixConfig, MediaConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_file},
};
