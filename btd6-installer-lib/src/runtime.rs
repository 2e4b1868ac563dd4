//! .NET 6 runtime dependency check and installation

use crate::config::{Artifact, RuntimeConfig};
use crate::download::Fetcher;
use crate::error::{InstallerError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Answers whether the required runtime is present
pub trait RuntimeProbe {
    fn is_installed(&self) -> Result<bool>;
}

/// Probe reading a fixed key under `HKEY_LOCAL_MACHINE`
#[derive(Debug, Clone)]
pub struct RegistryProbe {
    key: String,
}

impl RegistryProbe {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl RuntimeProbe for RegistryProbe {
    #[cfg(windows)]
    fn is_installed(&self) -> Result<bool> {
        use winreg::enums::HKEY_LOCAL_MACHINE;
        use winreg::RegKey;

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        match hklm.open_subkey(&self.key) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Registry key HKLM\\{} not found", self.key);
                Ok(false)
            }
            Err(e) => Err(InstallerError::Registry(format!(
                "HKLM\\{}: {}",
                self.key, e
            ))),
        }
    }

    #[cfg(not(windows))]
    fn is_installed(&self) -> Result<bool> {
        debug!(
            "Registry lookup of HKLM\\{} not available on this platform",
            self.key
        );
        Ok(true)
    }
}

/// Runs an installer executable and waits for it to exit
pub trait Launcher {
    /// Returns the exit code, if the platform reports one
    fn run_and_wait(&self, program: &Path) -> Result<Option<i32>>;
}

/// Launches programs as child processes of the installer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn run_and_wait(&self, program: &Path) -> Result<Option<i32>> {
        let status = Command::new(program)
            .status()
            .map_err(|e| InstallerError::CommandExecution {
                command: program.display().to_string(),
                error: e.to_string(),
            })?;
        Ok(status.code())
    }
}

/// Downloads, runs and removes the runtime installer
pub struct RuntimeInstaller<F, L> {
    fetcher: F,
    launcher: L,
    installer: Artifact,
    download_dir: PathBuf,
}

impl<F: Fetcher, L: Launcher> RuntimeInstaller<F, L> {
    pub fn new(fetcher: F, launcher: L, runtime: &RuntimeConfig, download_dir: PathBuf) -> Self {
        Self {
            fetcher,
            launcher,
            installer: runtime.installer.clone(),
            download_dir,
        }
    }

    /// Where the installer executable is saved before launching
    pub fn installer_path(&self) -> PathBuf {
        self.download_dir.join(&self.installer.file_name)
    }

    /// Download the installer, run it to completion and delete it.
    ///
    /// The installer's exit code is returned for reporting only; a non-zero
    /// code is not treated as a failure.
    pub fn install(&self) -> Result<Option<i32>> {
        std::fs::create_dir_all(&self.download_dir)?;
        let path = self.installer_path();

        self.fetcher.fetch(&self.installer, &path)?;
        info!("Launching runtime installer {}", path.display());
        let code = self.launcher.run_and_wait(&path)?;
        info!("Runtime installer exited with code {:?}", code);

        std::fs::remove_file(&path)?;

        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::cell::RefCell;

    struct WriteFetcher;

    impl Fetcher for WriteFetcher {
        fn fetch(&self, _artifact: &Artifact, dest: &Path) -> Result<u64> {
            std::fs::write(dest, b"MZ")?;
            Ok(2)
        }
    }

    #[derive(Default)]
    struct RecordingLauncher {
        seen: RefCell<Vec<(PathBuf, bool)>>,
        code: Option<i32>,
    }

    impl Launcher for &RecordingLauncher {
        fn run_and_wait(&self, program: &Path) -> Result<Option<i32>> {
            self.seen
                .borrow_mut()
                .push((program.to_path_buf(), program.is_file()));
            Ok(self.code)
        }
    }

    #[test]
    fn installer_runs_then_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = RecordingLauncher {
            code: Some(1602),
            ..Default::default()
        };
        let config = Config::default();
        let installer = RuntimeInstaller::new(
            WriteFetcher,
            &launcher,
            &config.runtime,
            dir.path().join("downloads"),
        );

        let code = installer.install().unwrap();

        assert_eq!(code, Some(1602));
        let seen = launcher.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, installer.installer_path());
        assert!(seen[0].1, "installer must exist while it runs");
        assert!(!installer.installer_path().exists());
    }

    #[cfg(not(windows))]
    #[test]
    fn registry_probe_is_satisfied_off_windows() {
        let probe = RegistryProbe::new(Config::default().runtime.registry_key);
        assert!(probe.is_installed().unwrap());
    }
}
