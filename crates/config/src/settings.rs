use color_eyre::eyre::{Result, bail};
use gameshelf_models::ThumbnailFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_NAME: &str = "gameshelf";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
    #[serde(default = "default_thumbnail_max_dimension")]
    pub thumbnail_max_dimension: u32,
    #[serde(default)]
    pub thumbnail_format: ThumbnailFormat,
    /// `None` keeps every thumbnail for the life of the process.
    #[serde(default)]
    pub thumbnail_cache_capacity: Option<usize>,
    #[serde(default = "default_downloadable_extensions")]
    pub downloadable_extensions: Vec<String>,
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    #[serde(default = "default_blocked_download_extensions")]
    pub blocked_download_extensions: Vec<String>,
    #[serde(default)]
    pub skip_hidden_files: bool,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

// Default value functions for serde
fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_items_per_page() -> usize {
    18
}
fn default_thumbnail_max_dimension() -> u32 {
    320
}
fn default_downloadable_extensions() -> Vec<String> {
    ["jar", "sis", "sisx", "zip"].map(String::from).to_vec()
}
fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg"].map(String::from).to_vec()
}
fn default_blocked_download_extensions() -> Vec<String> {
    ["txt", "html"].map(String::from).to_vec()
}
fn default_worker_threads() -> usize {
    num_cpus::get()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            items_per_page: default_items_per_page(),
            thumbnail_max_dimension: default_thumbnail_max_dimension(),
            thumbnail_format: ThumbnailFormat::default(),
            thumbnail_cache_capacity: None,
            downloadable_extensions: default_downloadable_extensions(),
            image_extensions: default_image_extensions(),
            blocked_download_extensions: default_blocked_download_extensions(),
            skip_hidden_files: false,
            worker_threads: default_worker_threads(),
        }
    }
}

impl Settings {
    /// Loads settings from the user's config directory, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined, or if the
    /// config file exists but cannot be read, parsed or validated.
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path).await
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Loads settings from an explicit TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or holds
    /// values rejected by [`Settings::validate`].
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let settings: Self = toml::from_str(&content)?;
        settings.validate()?;

        info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Writes the settings as TOML to the user's config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined or written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(config_path, toml_string)?;

        info!("Settings saved to {:?}", config_path);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error for a zero page size, a zero thumbnail bound, a zero
    /// cache capacity or zero worker threads.
    pub fn validate(&self) -> Result<()> {
        if self.items_per_page == 0 {
            bail!("items_per_page must be at least 1");
        }
        if self.thumbnail_max_dimension == 0 {
            bail!("thumbnail_max_dimension must be at least 1");
        }
        if self.thumbnail_cache_capacity == Some(0) {
            bail!("thumbnail_cache_capacity must be at least 1 when set");
        }
        if self.worker_threads == 0 {
            bail!("worker_threads must be at least 1");
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| color_eyre::eyre::eyre!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
