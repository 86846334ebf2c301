use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use std::io::{Read, Write};
use std::path::Path;

use crate::ui::Ui;

pub struct DatasetClient {
    client: Client,
}

impl DatasetClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("porydex-db/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// Download a dataset archive to `dest`, reporting progress to the UI
    pub fn download_archive(&self, url: &str, dest: &Path, ui: &mut impl Ui) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to start download of {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Download of {} failed: HTTP {}", url, status);
        }

        let total_size = response.content_length().unwrap_or(0);
        let mut file = std::fs::File::create(dest).context("Failed to create destination file")?;

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; 8192];

        loop {
            let bytes_read = response
                .read(&mut buffer)
                .context("Failed to read from response")?;
            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read])
                .context("Failed to write to file")?;

            downloaded += bytes_read as u64;
            ui.set_progress(downloaded, total_size, format_bytes(downloaded, total_size));
        }

        ui.log(format!("Downloaded {}", format_bytes(downloaded, total_size)));
        Ok(downloaded)
    }
}

/// Format bytes as human-readable string
fn format_bytes(current: u64, total: u64) -> String {
    fn fmt(bytes: u64) -> String {
        match bytes {
            b if b >= 1_000_000 => format!("{:.1} MB", b as f64 / 1_000_000.0),
            b if b >= 1_000 => format!("{:.1} KB", b as f64 / 1_000.0),
            b => format!("{} B", b),
        }
    }

    if total == 0 {
        fmt(current)
    } else {
        format!("{} / {}", fmt(current), fmt(total))
    }
}
