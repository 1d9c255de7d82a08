use crate::domain::{DEFAULT_THEME, RenderOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub github_token: Option<String>,
    pub api_base_url: String,
    pub syntax_highlighting: bool,
    pub syntax_theme: String,
    pub word_diff: bool,
    pub hide_header_only_hunks: bool,
    pub search_debounce_ms: u64,
    pub render_cache_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            syntax_highlighting: true,
            syntax_theme: DEFAULT_THEME.to_string(),
            word_diff: true,
            hide_header_only_hunks: true,
            search_debounce_ms: 500,
            render_cache_capacity: 256,
        }
    }
}

impl AppConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            syntax_highlighting: self.syntax_highlighting,
            theme: self.syntax_theme.clone(),
            word_diff: self.word_diff,
            hide_header_only_hunks: self.hide_header_only_hunks,
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// A non-empty `GITHUB_TOKEN` replaces the configured token.
    pub fn with_env_overrides(self) -> Self {
        self.with_token_override(std::env::var("GITHUB_TOKEN").ok())
    }

    fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            self.github_token = Some(token);
        }
        self
    }
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> AppConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return AppConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Ignoring invalid config at {}: {err}", path.display());
            AppConfig::default()
        }
    }
}

pub fn save_config(config: &AppConfig) -> std::io::Result<()> {
    save_config_to(&config_path(), config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    std::fs::write(path, contents)
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("PATCHVIEW_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("config.toml")
}

fn app_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("PATCHVIEW_DATA_HOME") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("Patchview");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("Patchview");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("patchview");
        }
        if let Some(home) = home::home_dir() {
            return home.join(".config").join("patchview");
        }
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".patchview")
}
