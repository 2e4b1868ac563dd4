//! Mod installation workflow
//!
//! [`InstallOrchestrator`] decides whether MelonLoader is already present in a
//! game directory and, if not, places the loader, the Mod Helper and (for Epic
//! Games copies) the compatibility plugin. Steps run strictly in order and the
//! first failure aborts the rest. Nothing is rolled back: files written before
//! the failure stay on disk.

use crate::archive::extract_zip;
use crate::config::{GameLayout, ModSources};
use crate::discovery::CandidateInstallation;
use crate::download::Fetcher;
use crate::error::{InstallerError, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A validated game directory that mods are installed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationTarget {
    dir: PathBuf,
}

impl InstallationTarget {
    /// Validate `dir` as an installation target; it must be an existing directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(InstallerError::InvalidTarget(dir));
        }
        Ok(Self { dir })
    }

    /// Target for the folder containing a discovered executable
    pub fn from_candidate(candidate: &CandidateInstallation) -> Result<Self> {
        let dir = candidate
            .game_dir()
            .ok_or_else(|| InstallerError::InvalidTarget(candidate.executable.clone()))?;
        Self::new(dir)
    }

    /// Target from an operator-supplied path, either the game folder or its executable
    pub fn from_user_path(path: &Path) -> Result<Self> {
        if path.is_file() {
            Self::from_candidate(&CandidateInstallation::new(path))
        } else {
            Self::new(path)
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Files placed by a successful [`InstallOrchestrator::install_mods`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Number of files extracted from the mod loader archive
    pub extracted_files: usize,

    /// Location of the Mod Helper library
    pub mod_helper: PathBuf,

    /// Location of the Epic compatibility plugin, if one was needed
    pub epic_compat: Option<PathBuf>,
}

/// Installs MelonLoader and the BTD6 Mod Helper into a game directory
pub struct InstallOrchestrator<F> {
    fetcher: F,
    sources: ModSources,
    layout: GameLayout,
}

impl<F: Fetcher> InstallOrchestrator<F> {
    pub fn new(fetcher: F, sources: ModSources, layout: GameLayout) -> Self {
        Self {
            fetcher,
            sources,
            layout,
        }
    }

    pub fn layout(&self) -> &GameLayout {
        &self.layout
    }

    /// Check for the mod loader marker directory directly under the target.
    ///
    /// Only the presence of the directory is checked; its contents are not.
    pub fn detect_existing_install(&self, target: &InstallationTarget) -> Result<bool> {
        for entry in fs::read_dir(target.dir())? {
            let entry = entry?;
            if entry.file_type()?.is_dir()
                && entry.file_name() == self.layout.mod_loader_marker.as_str()
            {
                debug!(
                    "Found {} in {}",
                    self.layout.mod_loader_marker,
                    target.dir().display()
                );
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Download and place the mod files.
    ///
    /// Callers gate this with [`detect_existing_install`](Self::detect_existing_install);
    /// invoked on an existing install it overwrites whatever is there.
    pub fn install_mods(&self, target: &InstallationTarget) -> Result<InstallReport> {
        let dir = target.dir();
        info!("Installing mods into {}", dir.display());

        let archive_path = dir.join(&self.sources.mod_loader.file_name);
        self.fetcher.fetch(&self.sources.mod_loader, &archive_path)?;
        let extracted_files = extract_zip(&archive_path, dir)?;
        fs::remove_file(&archive_path)?;
        info!("Extracted {} mod loader files", extracted_files);

        let mods_dir = dir.join(&self.layout.mods_dir);
        fs::create_dir_all(&mods_dir)?;
        let mod_helper = mods_dir.join(&self.sources.mod_helper.file_name);
        self.fetcher.fetch(&self.sources.mod_helper, &mod_helper)?;

        let epic_compat = if self.is_epic_install(dir)? {
            info!("Epic Games install detected, adding compatibility plugin");
            let plugins_dir = dir.join(&self.layout.plugins_dir);
            fs::create_dir_all(&plugins_dir)?;
            let compat = plugins_dir.join(&self.sources.epic_compat.file_name);
            self.fetcher.fetch(&self.sources.epic_compat, &compat)?;
            Some(compat)
        } else {
            None
        };

        Ok(InstallReport {
            extracted_files,
            mod_helper,
            epic_compat,
        })
    }

    /// Look for the Epic marker among the top-level files of `dir`
    fn is_epic_install(&self, dir: &Path) -> Result<bool> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && entry.file_name() == self.layout.epic_marker.as_str()
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    struct NoFetch;

    impl Fetcher for NoFetch {
        fn fetch(&self, artifact: &crate::config::Artifact, _dest: &Path) -> Result<u64> {
            panic!("unexpected fetch of {}", artifact.url);
        }
    }

    fn orchestrator() -> InstallOrchestrator<NoFetch> {
        let config = Config::default();
        InstallOrchestrator::new(NoFetch, config.sources, config.layout)
    }

    #[test]
    fn marker_directory_detected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("MelonLoader")).unwrap();
        let target = InstallationTarget::new(dir.path()).unwrap();

        assert!(orchestrator().detect_existing_install(&target).unwrap());
    }

    #[test]
    fn unrelated_tree_is_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Mods/MelonLoader")).unwrap();
        fs::write(dir.path().join("MelonLoader"), b"").unwrap();
        let target = InstallationTarget::new(dir.path()).unwrap();

        assert!(!orchestrator().detect_existing_install(&target).unwrap());
    }

    #[test]
    fn empty_directory_is_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let target = InstallationTarget::new(dir.path()).unwrap();

        assert!(!orchestrator().detect_existing_install(&target).unwrap());
    }

    #[test]
    fn missing_directory_is_invalid_target() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert!(matches!(
            InstallationTarget::new(&missing),
            Err(InstallerError::InvalidTarget(p)) if p == missing
        ));
    }

    #[test]
    fn user_path_may_name_the_executable() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("BloonsTD6.exe");
        fs::write(&exe, b"").unwrap();

        let target = InstallationTarget::from_user_path(&exe).unwrap();
        assert_eq!(target.dir(), dir.path());
    }
}
