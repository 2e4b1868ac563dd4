//! Configuration management for the installer
//!
//! Every fixed URL, file name and marker the installer relies on lives here.
//! Values come from the built-in defaults, then an optional TOML file, then
//! `BTD6_INSTALLER_*` environment variables, with `__` between nested keys
//! (`BTD6_INSTALLER_NETWORK__TIMEOUT_SECS=60`).

use crate::error::{InstallerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "BTD6_INSTALLER";

/// `BTD6_INSTALLER_SECTION__FIELD` variables from the process environment
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// A single file fetched from a fixed URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Download URL
    pub url: String,

    /// Name the file is saved under
    pub file_name: String,

    /// Optional pinned SHA256 checksum (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl Artifact {
    fn new(url: &str, file_name: &str) -> Self {
        Self {
            url: url.to_string(),
            file_name: file_name.to_string(),
            sha256: None,
        }
    }
}

/// .NET runtime dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Registry key under HKLM whose presence means the runtime is installed
    pub registry_key: String,

    /// Runtime installer executable
    pub installer: Artifact,
}

/// Mod files installed into the game directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSources {
    /// MelonLoader release archive, saved under `file_name` in the game
    /// directory until it is extracted
    pub mod_loader: Artifact,

    /// BTD6 Mod Helper library, placed under `Mods/`
    pub mod_helper: Artifact,

    /// Epic Games compatibility plugin, placed under `Plugins/`
    pub epic_compat: Artifact,
}

/// Names and paths describing a game installation on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLayout {
    /// Game executable searched for during discovery
    pub executable: String,

    /// Paths relative to a volume root that are searched for the executable
    pub search_prefixes: Vec<String>,

    /// Directory whose presence means the mod loader is installed
    pub mod_loader_marker: String,

    /// Top-level file that identifies an Epic Games copy
    pub epic_marker: String,

    /// Subdirectory receiving the mod helper
    pub mods_dir: String,

    /// Subdirectory receiving the Epic compatibility plugin
    pub plugins_dir: String,
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Overall per-request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl NetworkConfig {
    /// Overall request timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Installer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory for transient downloads (runtime installer)
    pub download_dir: PathBuf,

    /// Show progress bars while downloading
    pub progress: bool,

    pub runtime: RuntimeConfig,
    pub sources: ModSources,
    pub layout: GameLayout,
    pub network: NetworkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: std::env::temp_dir().join("btd6-installer"),
            progress: true,
            runtime: RuntimeConfig {
                registry_key: r"SOFTWARE\dotnet\Setup\InstalledVersions\x64\sharedhost".to_string(),
                installer: Artifact::new(
                    "https://github.com/Jonyboylovespie/BTD6ModInstaller/raw/master/BTD6Mods/dotnet6-runtime-installer.exe",
                    "dotnet6-runtime-installer.exe",
                ),
            },
            sources: ModSources {
                mod_loader: Artifact::new(
                    "https://github.com/LavaGang/MelonLoader/releases/download/v0.6.1/MelonLoader.x64.zip",
                    "melonloader.zip",
                ),
                mod_helper: Artifact::new(
                    "https://github.com/gurrenm3/BTD-Mod-Helper/releases/latest/download/Btd6ModHelper.dll",
                    "Btd6ModHelper.dll",
                ),
                epic_compat: Artifact::new(
                    "https://github.com/GrahamKracker/BTD6EpicGamesModCompat/releases/latest/download/BTD6EpicGamesModCompat.dll",
                    "BTD6EpicGamesModCompat.dll",
                ),
            },
            layout: GameLayout {
                executable: "BloonsTD6.exe".to_string(),
                search_prefixes: vec![
                    "Program Files (x86)/Steam/steamapps/common".to_string(),
                    "Program Files/Epic Games".to_string(),
                ],
                mod_loader_marker: "MelonLoader".to_string(),
                epic_marker: "EOSBootstrapper.exe".to_string(),
                mods_dir: "Mods".to_string(),
                plugins_dir: "Plugins".to_string(),
            },
            network: NetworkConfig {
                timeout_secs: 600,
                connect_timeout_secs: 30,
                user_agent: concat!("BTD6ModInstaller/", env!("CARGO_PKG_VERSION")).to_string(),
            },
        }
    }
}

impl Config {
    /// Default configuration file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("btd6-installer").join("config.toml"))
    }

    /// Load configuration from the default file location (if present) and environment
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("Could not determine config directory, using defaults and environment");
                Self::build(None, environment())
            }
        }
    }

    /// Load configuration from `path` (optional file) and environment
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
        } else {
            debug!("No configuration file at {}", path.display());
        }
        Self::build(Some(path), environment())
    }

    fn build(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path.to_path_buf())
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        let config: Config = builder
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the installer cannot act on
    pub fn validate(&self) -> Result<()> {
        let artifacts = [
            ("runtime.installer", &self.runtime.installer),
            ("sources.mod_loader", &self.sources.mod_loader),
            ("sources.mod_helper", &self.sources.mod_helper),
            ("sources.epic_compat", &self.sources.epic_compat),
        ];
        for (name, artifact) in artifacts {
            if artifact.url.trim().is_empty() {
                return Err(InstallerError::Config(format!("{}.url is empty", name)));
            }
            if artifact.file_name.trim().is_empty() {
                return Err(InstallerError::Config(format!("{}.file_name is empty", name)));
            }
        }

        if self.layout.executable.trim().is_empty() {
            return Err(InstallerError::Config("layout.executable is empty".into()));
        }
        if self.layout.mod_loader_marker.trim().is_empty() {
            return Err(InstallerError::Config(
                "layout.mod_loader_marker is empty".into(),
            ));
        }

        Ok(())
    }
}
