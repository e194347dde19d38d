use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "blueprint.editor.json";

/// Built-in palette blocks that have no place in a signing blueprint
pub const DEFAULT_PALETTE_DENY_LIST: &[&str] = &[
    "link",
    "quote",
    "text-basic",
    "text",
    "map",
    "video",
    "column3-7",
    "column3",
];

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Delay between container polls while mounting
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Polls before mounting is abandoned
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Delay before the single retry after a frame-not-ready failure
    #[serde(default = "default_transient_retry_delay_ms")]
    pub transient_retry_delay_ms: u64,

    /// Palette block ids removed after the engine loads
    #[serde(default = "default_palette_deny_list")]
    pub palette_deny_list: Vec<String>,

    /// Spaces per indentation level in the code view
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,

    /// Command id the code view is registered under
    #[serde(default = "default_code_view_command")]
    pub code_view_command: String,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_max_poll_attempts() -> u32 {
    50
}

fn default_transient_retry_delay_ms() -> u64 {
    100
}

fn default_palette_deny_list() -> Vec<String> {
    DEFAULT_PALETTE_DENY_LIST
        .iter()
        .map(|id| id.to_string())
        .collect()
}

fn default_indent_width() -> usize {
    2
}

fn default_code_view_command() -> String {
    "open-code".to_string()
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: EditorConfig = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn transient_retry_delay(&self) -> Duration {
        Duration::from_millis(self.transient_retry_delay_ms)
    }

    pub fn indent(&self) -> String {
        " ".repeat(self.indent_width)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            transient_retry_delay_ms: default_transient_retry_delay_ms(),
            palette_deny_list: default_palette_deny_list(),
            indent_width: default_indent_width(),
            code_view_command: default_code_view_command(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "pollIntervalMs": 25,
            "maxPollAttempts": 4,
            "paletteDenyList": ["map"]
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(25));
        assert_eq!(config.max_poll_attempts, 4);
        assert_eq!(config.palette_deny_list, vec!["map"]);
        // Unspecified fields keep their defaults
        assert_eq!(config.transient_retry_delay_ms, 100);
        assert_eq!(config.code_view_command, "open-code");
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.max_poll_attempts, 50);
        assert_eq!(config.palette_deny_list.len(), DEFAULT_PALETTE_DENY_LIST.len());
        assert_eq!(config.indent(), "  ");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("blueprint_config_missing");
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::fs::remove_file(dir.join(DEFAULT_CONFIG_NAME));

        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join("blueprint_config_present");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DEFAULT_CONFIG_NAME), r#"{ "indentWidth": 4 }"#).unwrap();

        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config.indent(), "    ");
    }

    #[test]
    fn test_load_reports_bad_file() {
        let dir = std::env::temp_dir().join("blueprint_config_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DEFAULT_CONFIG_NAME), r#"{ "indentWidth": "wide" }"#).unwrap();

        let err = EditorConfig::load(&dir).unwrap_err();
        assert!(format!("{:#}", err).contains(DEFAULT_CONFIG_NAME));
    }
}
