//! Browser configuration
//!
//! `config.toml` beside the executable holds a flat table of string keys.
//! Loading never fails: a missing, unreadable or malformed file is an empty
//! table, and every key missing from the table (or not a string) takes its
//! built-in default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use hythonium_download::DownloadSettings;
use hythonium_storage::TextFile;
use hythonium_tabs::EngineProfile;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Font family handed to the engine for every generic family
pub const DEFAULT_FONT_FAMILY: &str = "Microsoft Yahei";

const DEFAULT_HOMEPAGE: &str = "https://www.baidu.com";
const DEFAULT_SEARCH_ENGINE: &str = "https://www.baidu.com/s?wd=";
const DEFAULT_NEW_TAB: &str = "https://www.baidu.com";
const DEFAULT_DOWNLOAD_FOLDER: &str = "Downloads";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";
const DEFAULT_DOWNLOAD_FILENAME: &str = "download_file";

/// Parsed but unresolved configuration resource
pub type ConfigMap = toml::Table;

/// Keys recognised in the configuration resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Homepage,
    SearchEngine,
    NewTab,
    DownloadFolder,
    UserAgent,
    DefaultDownloadFilename,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 6] = [
        ConfigKey::Homepage,
        ConfigKey::SearchEngine,
        ConfigKey::NewTab,
        ConfigKey::DownloadFolder,
        ConfigKey::UserAgent,
        ConfigKey::DefaultDownloadFilename,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::Homepage => "homepage",
            ConfigKey::SearchEngine => "search_engine",
            ConfigKey::NewTab => "new_tab",
            ConfigKey::DownloadFolder => "download_folder",
            ConfigKey::UserAgent => "user_agent",
            ConfigKey::DefaultDownloadFilename => "default_download_filename",
        }
    }

    pub fn default_value(&self) -> &'static str {
        match self {
            ConfigKey::Homepage => DEFAULT_HOMEPAGE,
            ConfigKey::SearchEngine => DEFAULT_SEARCH_ENGINE,
            ConfigKey::NewTab => DEFAULT_NEW_TAB,
            ConfigKey::DownloadFolder => DEFAULT_DOWNLOAD_FOLDER,
            ConfigKey::UserAgent => DEFAULT_USER_AGENT,
            ConfigKey::DefaultDownloadFilename => DEFAULT_DOWNLOAD_FILENAME,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ConfigKey::Homepage => "Page opened in the first tab",
            ConfigKey::SearchEngine => {
                "Query prefix for address bar searches (use %s to place the query elsewhere)"
            }
            ConfigKey::NewTab => "Page opened by the new tab button",
            ConfigKey::DownloadFolder => {
                "Where downloads are saved, relative to the working directory"
            }
            ConfigKey::UserAgent => "User-Agent header sent with every request",
            ConfigKey::DefaultDownloadFilename => "File name used when a download URL has none",
        }
    }
}

/// Value of `key` in `map`, or its default when absent or not a string.
pub fn resolve(map: &ConfigMap, key: ConfigKey) -> String {
    match map.get(key.name()) {
        Some(toml::Value::String(value)) => value.clone(),
        Some(other) => {
            tracing::warn!(
                key = key.name(),
                found = other.type_str(),
                "Config value is not a string, using default"
            );
            key.default_value().to_string()
        }
        None => key.default_value().to_string(),
    }
}

/// Parse configuration text. Malformed text is an empty table.
pub fn parse_mapping(text: &str) -> ConfigMap {
    match toml::from_str::<ConfigMap>(text) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse config, using defaults");
            ConfigMap::new()
        }
    }
}

/// Read and parse the configuration resource at `path`.
///
/// Returns an empty table if the file doesn't exist, can't be read or
/// can't be parsed.
pub fn load_mapping(path: &Path) -> ConfigMap {
    match TextFile::open(path).read_to_string() {
        Ok(Some(content)) => {
            tracing::debug!(path = %path.display(), "Loaded config");
            parse_mapping(&content)
        }
        Ok(None) => {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            ConfigMap::new()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read config");
            ConfigMap::new()
        }
    }
}

/// Commented configuration holding every key at its default
pub fn default_config_text() -> String {
    let mut text = String::from(
        "# Hythonium configuration\n\
         #\n\
         # Missing keys use their defaults, unknown keys are ignored and a file\n\
         # that fails to parse is ignored entirely.\n",
    );
    for key in ConfigKey::ALL {
        text.push_str(&format!(
            "\n# {}\n{} = {}\n",
            key.description(),
            key.name(),
            toml::Value::String(key.default_value().to_string())
        ));
    }
    text
}

/// Resolved configuration. Immutable once built; replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Page opened in the first tab
    pub homepage: String,
    /// Search engine query prefix
    pub search_engine: String,
    /// Page opened by the new tab control
    pub new_tab: String,
    /// Download directory
    pub download_folder: PathBuf,
    pub user_agent: String,
    /// Fallback name for downloads whose URL names no file
    pub default_download_filename: String,
}

impl Config {
    pub fn from_mapping(map: &ConfigMap) -> Self {
        Self {
            homepage: resolve(map, ConfigKey::Homepage),
            search_engine: resolve(map, ConfigKey::SearchEngine),
            new_tab: resolve(map, ConfigKey::NewTab),
            download_folder: PathBuf::from(resolve(map, ConfigKey::DownloadFolder)),
            user_agent: resolve(map, ConfigKey::UserAgent),
            default_download_filename: resolve(map, ConfigKey::DefaultDownloadFilename),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_mapping(&parse_mapping(text))
    }

    pub fn load_from(path: &Path) -> Self {
        Self::from_mapping(&load_mapping(path))
    }

    /// Load `config.toml` from beside the executable
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        hythonium_storage::resource_path(CONFIG_FILE_NAME)
    }

    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            download_dir: self.download_folder.clone(),
            default_file_name: self.default_download_filename.clone(),
        }
    }

    pub fn engine_profile(&self) -> EngineProfile {
        EngineProfile {
            user_agent: self.user_agent.clone(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_mapping(&ConfigMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_for_empty_mapping() {
        let config = Config::default();
        assert_eq!(config.homepage, DEFAULT_HOMEPAGE);
        assert_eq!(config.search_engine, DEFAULT_SEARCH_ENGINE);
        assert_eq!(config.new_tab, DEFAULT_NEW_TAB);
        assert_eq!(config.download_folder, PathBuf::from("Downloads"));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.default_download_filename, "download_file");
    }

    #[test]
    fn test_present_keys_override_missing_keys_default() {
        let map = parse_mapping(
            r#"
homepage = "https://example.com"
download_folder = "/tmp/dl"
unknown_key = "ignored"
"#,
        );

        for key in ConfigKey::ALL {
            let expected = match key {
                ConfigKey::Homepage => "https://example.com",
                ConfigKey::DownloadFolder => "/tmp/dl",
                other => other.default_value(),
            };
            assert_eq!(resolve(&map, key), expected, "key {}", key.name());
        }
    }

    #[test]
    fn test_non_string_value_uses_default() {
        let map = parse_mapping("homepage = 42\nnew_tab = [\"a\"]\n");
        assert_eq!(resolve(&map, ConfigKey::Homepage), DEFAULT_HOMEPAGE);
        assert_eq!(resolve(&map, ConfigKey::NewTab), DEFAULT_NEW_TAB);
    }

    #[test]
    fn test_malformed_text_is_empty_mapping() {
        let map = parse_mapping("config = {\n  \"homepage\": \"x\",\n}");
        assert!(map.is_empty());
        assert_eq!(Config::from_mapping(&map), Config::default());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempdir().unwrap();
        assert!(load_mapping(&temp.path().join(CONFIG_FILE_NAME)).is_empty());
    }

    #[test]
    fn test_load_custom_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "search_engine = \"https://duckduckgo.com/?q=\"\n").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.search_engine, "https://duckduckgo.com/?q=");
        assert_eq!(config.homepage, DEFAULT_HOMEPAGE);
    }

    #[test]
    fn test_load_malformed_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        for malformed in [
            "homepage = \"https://a.com\"\nhomepage = \"https://b.com\"\n",
            "homepage = \"unterminated\n",
            "config = {\n  \"homepage\": \"x\",\n}",
            "[homepage\n",
        ] {
            std::fs::write(&path, malformed).unwrap();

            assert!(load_mapping(&path).is_empty(), "{:?}", malformed);
            assert_eq!(Config::load_from(&path), Config::default());
        }

        std::fs::write(&path, b"homepage = \"\xff\"\n").unwrap();
        assert!(load_mapping(&path).is_empty());
    }

    #[test]
    fn test_load_unreadable_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::create_dir(&path).unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_default_text_resolves_to_defaults() {
        let map = parse_mapping(&default_config_text());
        assert_eq!(map.len(), ConfigKey::ALL.len());
        assert_eq!(Config::from_mapping(&map), Config::default());
    }

    #[test]
    fn test_derived_settings() {
        let config = Config::from_text("download_folder = \"dl\"\nuser_agent = \"UA\"\n");
        assert_eq!(config.download_settings().download_dir, PathBuf::from("dl"));
        assert_eq!(config.download_settings().default_file_name, "download_file");
        assert_eq!(config.engine_profile().user_agent, "UA");
        assert_eq!(config.engine_profile().font_family, DEFAULT_FONT_FAMILY);
    }
}
