//! BTD6 Mod Installer Library
//!
//! Finds Bloons TD 6 installations, installs MelonLoader and the BTD6 Mod
//! Helper into them, and makes sure the .NET 6 runtime the loader needs is
//! present.
//!
//! All operations are synchronous and block until their network or disk work
//! is done.

pub mod archive;
pub mod config;
pub mod discovery;
pub mod download;
pub mod error;
pub mod orchestrator;
pub mod runtime;
pub mod session;

pub use crate::config::{Artifact, Config, GameLayout, ModSources, NetworkConfig, RuntimeConfig};
pub use crate::discovery::{discover_candidates, system_volumes, CandidateInstallation};
pub use crate::download::{DownloadManager, Fetcher};
pub use crate::error::{InstallerError, Result};
pub use crate::orchestrator::{InstallOrchestrator, InstallReport, InstallationTarget};
pub use crate::runtime::{Launcher, RegistryProbe, RuntimeInstaller, RuntimeProbe, SystemLauncher};
pub use crate::session::{InstallOutcome, InstallSession};
