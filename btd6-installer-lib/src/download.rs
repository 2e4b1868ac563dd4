//! Blocking downloads with optional checksum verification

use crate::config::{Artifact, NetworkConfig};
use crate::error::{InstallerError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Source of downloaded files.
///
/// Every call blocks until the file is fully written to `dest` or the fetch
/// fails. Implementations must not create parent directories; callers do.
pub trait Fetcher {
    /// Fetch `artifact` into `dest`, returning the number of bytes written
    fn fetch(&self, artifact: &Artifact, dest: &Path) -> Result<u64>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, artifact: &Artifact, dest: &Path) -> Result<u64> {
        (**self).fetch(artifact, dest)
    }
}

/// HTTP download manager
pub struct DownloadManager {
    client: Client,
    progress: bool,
}

impl DownloadManager {
    /// Create a new download manager
    pub fn new(network: &NetworkConfig, progress: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(network.user_agent.as_str())
            .connect_timeout(network.connect_timeout())
            .timeout(network.timeout())
            .build()?;

        Ok(Self { client, progress })
    }

    fn progress_bar(&self, total_size: u64, label: &str) -> Result<Option<ProgressBar>> {
        if !self.progress || total_size == 0 {
            return Ok(None);
        }

        let pb = ProgressBar::new(total_size);
        let style = ProgressStyle::default_bar()
            .template("{msg} {bar:40.cyan/blue} {bytes}/{total_bytes} {eta}")
            .map_err(|e| InstallerError::Download(format!("Progress bar template error: {}", e)))?;
        pb.set_style(style);
        pb.set_message(label.to_string());
        Ok(Some(pb))
    }
}

impl Fetcher for DownloadManager {
    fn fetch(&self, artifact: &Artifact, dest: &Path) -> Result<u64> {
        info!("Downloading {} from {}", artifact.file_name, artifact.url);

        let mut response = self.client.get(&artifact.url).send()?.error_for_status()?;
        let total_size = response.content_length().unwrap_or(0);
        let pb = self.progress_bar(total_size, &artifact.file_name)?;

        let mut file = std::fs::File::create(dest)?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 64 * 1024];
        let mut written = 0u64;

        loop {
            let n = response.read(&mut buf)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            hasher.update(&buf[..n]);
            written += n as u64;

            if let Some(ref pb) = pb {
                pb.inc(n as u64);
            }
        }
        file.flush()?;

        if let Some(pb) = pb {
            pb.finish_with_message("Downloaded");
        }

        if let Some(expected) = artifact.sha256.as_deref() {
            let computed = format!("{:x}", hasher.finalize());
            if !computed.eq_ignore_ascii_case(expected) {
                drop(file);
                std::fs::remove_file(dest)?;
                return Err(InstallerError::ChecksumMismatch {
                    expected: expected.to_string(),
                    got: computed,
                });
            }
        }

        debug!("Wrote {} bytes to {}", written, dest.display());
        Ok(written)
    }
}
