use reqlens_pypi::{DEFAULT_ANNOTATION_COLUMN, OUTDATED_LABEL, UP_TO_DATE_LABEL};
use serde::Deserialize;

/// Root configuration for the reqlens server.
///
/// Provided by the LSP client via initialization options or
/// `workspace/didChangeConfiguration`. All fields use sensible defaults if
/// not specified.
///
/// # Examples
///
/// ```
/// use reqlens_lsp::config::ReqlensConfig;
///
/// let json = r#"{
///     "annotations": {
///         "enabled": true,
///         "outdated_text": "outdated",
///         "column": 100
///     }
/// }"#;
///
/// let config: ReqlensConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.annotations.outdated_text, "outdated");
/// assert_eq!(config.annotations.up_to_date_text, "🟢 Updated version");
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReqlensConfig {
    #[serde(default)]
    pub annotations: AnnotationsConfig,
    #[serde(default)]
    pub code_lens: CodeLensConfig,
    #[serde(default)]
    pub parsing: ParsingConfig,
}

impl ReqlensConfig {
    /// Reads settings sent by a client.
    ///
    /// Clients either send the settings object itself or nest it under a
    /// `reqlens` key. Returns `None` when the payload does not deserialize.
    pub fn from_settings(settings: serde_json::Value) -> Option<Self> {
        let settings = match settings {
            serde_json::Value::Object(mut map) if map.contains_key("reqlens") => {
                map.remove("reqlens").unwrap_or_default()
            }
            other => other,
        };

        match serde_json::from_value(settings) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring invalid configuration: {}", e);
                None
            }
        }
    }
}

/// Inline annotations after each declaration.
///
/// # Defaults
///
/// - `enabled`: `true`
/// - `outdated_text`: `"🟡 Outdated version"`
/// - `up_to_date_text`: `"🟢 Updated version"`
/// - `column`: `80`
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(
        default = "default_outdated_text",
        deserialize_with = "deserialize_label"
    )]
    pub outdated_text: String,
    #[serde(
        default = "default_up_to_date_text",
        deserialize_with = "deserialize_label"
    )]
    pub up_to_date_text: String,
    /// Virtual column labels are right-aligned to.
    #[serde(default = "default_column")]
    pub column: u32,
}

impl Default for AnnotationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            outdated_text: default_outdated_text(),
            up_to_date_text: default_up_to_date_text(),
            column: default_column(),
        }
    }
}

/// Latest-version code lens above each declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeLensConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CodeLensConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Manifest parsing behavior.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsingConfig {
    /// Scan `dependencies = [...]` blocks line by line when a
    /// `pyproject.toml` does not parse.
    #[serde(default)]
    pub fallback_line_scan: bool,
}

// Default value functions
const fn default_true() -> bool {
    true
}

fn default_outdated_text() -> String {
    OUTDATED_LABEL.to_string()
}

fn default_up_to_date_text() -> String {
    UP_TO_DATE_LABEL.to_string()
}

const fn default_column() -> u32 {
    DEFAULT_ANNOTATION_COLUMN
}

/// Maximum length for annotation labels, in characters.
const MAX_LABEL_LENGTH: usize = 100;

fn validate_label(text: String) -> String {
    let length = text.chars().count();
    if length > MAX_LABEL_LENGTH {
        tracing::warn!(
            "annotation label exceeded max length of {} chars, truncating from {}",
            MAX_LABEL_LENGTH,
            length
        );
        text.chars().take(MAX_LABEL_LENGTH).collect()
    } else {
        text
    }
}

fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    Ok(validate_label(text))
}
