//! Config checks: unknown keys (with spelling hints), types, and the values
//! a send needs.

use std::path::{Path, PathBuf};

use {secrecy::ExposeSecret, serde_json::Value};

use crate::{
    loader::{find_config_file, load_config_value},
    schema::CourierConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// One of "syntax", "unknown-field", "type-error", "missing", "invalid".
    pub category: &'static str,
    /// Dotted path, e.g. "matrix.homeserver".
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(category: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

const TOP_LEVEL_KEYS: &[&str] = &["matrix", "media"];
const MATRIX_KEYS: &[&str] = &[
    "homeserver",
    "user_id",
    "device_id",
    "access_token",
    "room_id",
];
const MEDIA_KEYS: &[&str] = &["measure_missing_content_length"];

fn known_keys(section: &str) -> Option<&'static [&'static str]> {
    match section {
        "" => Some(TOP_LEVEL_KEYS),
        "matrix" => Some(MATRIX_KEYS),
        "media" => Some(MEDIA_KEYS),
        _ => None,
    }
}

/// Check the values a send depends on.
#[must_use]
pub fn validate(config: &CourierConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let matrix = &config.matrix;

    if matrix.homeserver.trim().is_empty() {
        diagnostics.push(Diagnostic::error(
            "missing",
            "matrix.homeserver",
            "homeserver is not set",
        ));
    } else {
        match url::Url::parse(&matrix.homeserver) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
                if url.scheme() == "http" {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Warning,
                        category: "invalid",
                        path: "matrix.homeserver".into(),
                        message: "homeserver uses plain http; the access token is sent unencrypted"
                            .into(),
                    });
                }
            },
            Ok(_) => diagnostics.push(Diagnostic::error(
                "invalid",
                "matrix.homeserver",
                format!("homeserver must be an http(s) URL, got {}", matrix.homeserver),
            )),
            Err(e) => diagnostics.push(Diagnostic::error(
                "invalid",
                "matrix.homeserver",
                format!("homeserver is not a valid URL: {e}"),
            )),
        }
    }

    if matrix.access_token.expose_secret().trim().is_empty() {
        diagnostics.push(Diagnostic::error(
            "missing",
            "matrix.access_token",
            "access token is not set",
        ));
    }

    match matrix.room_id.as_deref().map(str::trim) {
        None | Some("") => diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "missing",
            path: "matrix.room_id".into(),
            message: "no default room; every send must name one".into(),
        }),
        Some(room) if !room.starts_with('!') && !room.starts_with('#') => {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                category: "invalid",
                path: "matrix.room_id".into(),
                message: format!("room id {room} does not start with '!' or '#'"),
            });
        },
        Some(_) => {},
    }

    diagnostics
}

/// Validate a config file, or the discovered one when `path` is `None`.
///
/// Checks syntax, unknown keys and types; the values themselves go through
/// [`validate`] once the file deserializes.
#[must_use]
pub fn validate_file(path: Option<&Path>) -> ValidationResult {
    let Some(config_path) = path.map(Path::to_path_buf).or_else(find_config_file) else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "syntax",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    let mut result = match load_config_value(&config_path) {
        Ok(value) => validate_value(&value),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::error("syntax", "", format!("{e:#}"))],
            config_path: None,
        },
    };
    result.config_path = Some(config_path);
    result
}

/// Validate an already parsed config tree.
#[must_use]
pub fn validate_value(value: &Value) -> ValidationResult {
    let mut diagnostics = Vec::new();
    check_unknown_fields(value, "", &mut diagnostics);

    match serde_json::from_value::<CourierConfig>(value.clone()) {
        Ok(config) => diagnostics.extend(validate(&config)),
        Err(e) => diagnostics.push(Diagnostic::error(
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(value: &Value, prefix: &str, diagnostics: &mut Vec<Diagnostic>) {
    let (Value::Object(table), Some(known)) = (value, known_keys(prefix)) else {
        return;
    };
    for (key, child) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if known.contains(&key.as_str()) {
            check_unknown_fields(child, &path, diagnostics);
            continue;
        }
        let message = match suggest(key, known, 3) {
            Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
            None => "unknown field".to_string(),
        };
        diagnostics.push(Diagnostic::error("unknown-field", path, message));
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    fn complete() -> Value {
        json!({
            "matrix": {
                "homeserver": "https://matrix.example.org",
                "access_token": "syt_abc",
                "room_id": "!room:example.org"
            }
        })
    }

    #[test]
    fn complete_config_is_clean() {
        let result = validate_value(&complete());
        assert!(
            result.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            result.diagnostics
        );
    }

    #[test]
    fn misspelled_key_gets_suggestion() {
        let mut value = complete();
        value["matrix"]["homeservr"] = json!("https://x.example");
        let result = validate_value(&value);
        let unknown = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field" && d.path == "matrix.homeservr")
            .unwrap();
        assert!(unknown.message.contains("homeserver"));
        assert!(result.has_errors());
    }

    #[test]
    fn unknown_section_without_close_match() {
        let mut value = complete();
        value["telemetry"] = json!({ "enabled": true });
        let result = validate_value(&value);
        let unknown = result
            .diagnostics
            .iter()
            .find(|d| d.path == "telemetry")
            .unwrap();
        assert_eq!(unknown.message, "unknown field");
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut value = complete();
        value["media"] = json!({ "measure_missing_content_length": "yes" });
        let result = validate_value(&value);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "type-error")
        );
    }

    #[rstest]
    #[case("", "missing")]
    #[case("matrix.example.org", "invalid")]
    #[case("ftp://matrix.example.org", "invalid")]
    fn bad_homeserver(#[case] homeserver: &str, #[case] category: &str) {
        let mut config: CourierConfig = serde_json::from_value(complete()).unwrap();
        config.matrix.homeserver = homeserver.into();
        let diagnostics = validate(&config);
        let d = diagnostics
            .iter()
            .find(|d| d.path == "matrix.homeserver")
            .unwrap();
        assert_eq!(d.category, category);
        assert_eq!(d.severity, Severity::Error);
    }

    #[test]
    fn plain_http_is_a_warning() {
        let mut config: CourierConfig = serde_json::from_value(complete()).unwrap();
        config.matrix.homeserver = "http://localhost:8008".into();
        let diagnostics = validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn defaults_need_token_and_homeserver() {
        let diagnostics = validate(&CourierConfig::default());
        let errors: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(errors, ["matrix.homeserver", "matrix.access_token"]);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.path == "matrix.room_id" && d.severity == Severity::Warning)
        );
    }

    #[test]
    fn validates_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courier.toml");
        std::fs::write(&path, "[matrix]\nacess_token = \"x\"\n").unwrap();
        let result = validate_file(Some(&path));
        assert_eq!(result.config_path.as_deref(), Some(path.as_path()));
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "matrix.acess_token" && d.message.contains("access_token"))
        );
    }

    #[test]
    fn syntax_error_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courier.toml");
        std::fs::write(&path, "[matrix\n").unwrap();
        let result = validate_file(Some(&path));
        assert_eq!(result.count(Severity::Error), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn suggestion_picks_nearest() {
        assert_eq!(suggest("banana", MATRIX_KEYS, 3), None);
        assert_eq!(suggest("room_di", MATRIX_KEYS, 3), Some("room_id"));
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }
}
