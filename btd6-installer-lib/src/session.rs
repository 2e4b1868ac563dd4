//! Per-run installer state

use crate::config::GameLayout;
use crate::discovery::CandidateInstallation;
use crate::download::Fetcher;
use crate::error::{InstallerError, Result};
use crate::orchestrator::{InstallOrchestrator, InstallReport, InstallationTarget};
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of [`InstallSession::install`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The mod loader marker was already present; nothing was touched
    AlreadyInstalled(PathBuf),
    /// Mods were installed
    Installed(InstallReport),
}

/// Discovered candidates, the operator's selection and the last failure
#[derive(Debug, Default)]
pub struct InstallSession {
    candidates: Vec<CandidateInstallation>,
    selected: Option<usize>,
    last_error: Option<String>,
}

impl InstallSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidate list, selecting the first entry if there is one
    pub fn load_candidates<I>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = CandidateInstallation>,
    {
        self.candidates = candidates.into_iter().collect();
        self.selected = if self.candidates.is_empty() { None } else { Some(0) };
        info!("Found {} installation(s)", self.candidates.len());
    }

    pub fn candidates(&self) -> &[CandidateInstallation] {
        &self.candidates
    }

    /// Select the candidate at `index`
    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.candidates.len() {
            return Err(InstallerError::NoSelection);
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Add an operator-supplied game folder or executable path and select it.
    ///
    /// The path must name an existing folder or an existing file inside one;
    /// anything else is rejected and the selection is left unchanged.
    pub fn add_manual(&mut self, path: &Path, layout: &GameLayout) -> Result<()> {
        let target = InstallationTarget::from_user_path(path)?;
        let executable = if path.is_file() {
            path.to_path_buf()
        } else {
            target.dir().join(&layout.executable)
        };
        self.candidates.push(CandidateInstallation::new(executable));
        self.selected = Some(self.candidates.len() - 1);
        Ok(())
    }

    pub fn selected(&self) -> Option<&CandidateInstallation> {
        self.selected.and_then(|i| self.candidates.get(i))
    }

    /// Validated target for the current selection
    pub fn target(&self) -> Result<InstallationTarget> {
        let candidate = self.selected().ok_or(InstallerError::NoSelection)?;
        InstallationTarget::from_candidate(candidate)
    }

    /// Message of the most recent failed [`install`](Self::install)
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Install mods into the selected target unless they are already present.
    ///
    /// A failure is recorded as the last error and returned; a later call may
    /// simply retry.
    pub fn install<F: Fetcher>(
        &mut self,
        orchestrator: &InstallOrchestrator<F>,
    ) -> Result<InstallOutcome> {
        let result = self.target().and_then(|target| {
            if orchestrator.detect_existing_install(&target)? {
                info!("Mods already installed in {}", target.dir().display());
                return Ok(InstallOutcome::AlreadyInstalled(target.dir().to_path_buf()));
            }
            orchestrator
                .install_mods(&target)
                .map(InstallOutcome::Installed)
        });

        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }
}
