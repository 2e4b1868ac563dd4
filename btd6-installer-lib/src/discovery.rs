//! Game installation discovery across local volumes

use crate::config::GameLayout;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A game executable found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateInstallation {
    /// Path to the game executable
    pub executable: PathBuf,
}

impl CandidateInstallation {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Folder containing the executable
    pub fn game_dir(&self) -> Option<&Path> {
        self.executable.parent()
    }
}

/// Roots of the local volumes, in the order the system reports them
#[cfg(windows)]
pub fn system_volumes() -> Vec<PathBuf> {
    ('A'..='Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter)))
        .filter(|root| root.exists())
        .collect()
}

/// Roots of the local volumes, in the order the system reports them
#[cfg(not(windows))]
pub fn system_volumes() -> Vec<PathBuf> {
    vec![PathBuf::from("/")]
}

/// Lazily search `volumes` for the game executable.
///
/// Each volume is probed under every `layout.search_prefixes` entry; prefixes
/// that are missing or cannot be read contribute nothing. Unreadable entries
/// below a prefix are skipped so one bad directory never ends the scan.
pub fn discover_candidates<'a, I>(
    volumes: I,
    layout: &'a GameLayout,
) -> impl Iterator<Item = CandidateInstallation> + 'a
where
    I: IntoIterator<Item = PathBuf>,
    I::IntoIter: 'a,
{
    volumes.into_iter().flat_map(move |volume| {
        let roots: Vec<PathBuf> = layout
            .search_prefixes
            .iter()
            .map(|prefix| volume.join(prefix))
            .filter(|root| {
                let present = root.is_dir();
                if !present {
                    debug!("Skipping missing search root {}", root.display());
                }
                present
            })
            .collect();

        roots
            .into_iter()
            .flat_map(move |root| search_root(root, &layout.executable))
    })
}

fn search_root(
    root: PathBuf,
    executable: &str,
) -> impl Iterator<Item = CandidateInstallation> + '_ {
    debug!("Searching {} for {}", root.display(), executable);

    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Error while searching: {}", e);
                None
            }
        })
        .filter(move |entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.eq_ignore_ascii_case(executable))
        })
        .map(|entry| CandidateInstallation::new(entry.into_path()))
}
