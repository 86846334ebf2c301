use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::ui::Ui;

/// Extract the `.jsonl` files of a dataset archive into `dest_dir`, flattening
/// any directory prefix. Returns the number of files written.
///
/// The archive is unpacked into a staging directory next to `dest_dir`, which
/// then replaces `dest_dir` as a whole. Files from an earlier extraction never
/// survive into the new dataset.
pub fn extract_zip(zip_path: &Path, dest_dir: &Path, ui: &mut impl Ui) -> Result<usize> {
    let staging = staging_dir(dest_dir)?;
    if staging.exists() {
        fs::remove_dir_all(&staging)
            .with_context(|| format!("Failed to clear staging directory {:?}", staging))?;
    }

    let written = match unpack(zip_path, &staging, ui) {
        Ok(written) => written,
        Err(err) => {
            fs::remove_dir_all(&staging).ok();
            return Err(err);
        }
    };

    if dest_dir.exists() {
        fs::remove_dir_all(dest_dir)
            .with_context(|| format!("Failed to remove previous dataset {:?}", dest_dir))?;
    }
    fs::rename(&staging, dest_dir)
        .with_context(|| format!("Failed to move extracted dataset to {:?}", dest_dir))?;

    ui.log(format!("Extracted {} dataset files", written));
    Ok(written)
}

/// `<parent>/.<name>.partial`
fn staging_dir(dest_dir: &Path) -> Result<PathBuf> {
    let name = dest_dir
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid dataset directory {:?}", dest_dir))?;
    let parent = dest_dir.parent().unwrap_or_else(|| Path::new("."));
    Ok(parent.join(format!(".{}.partial", name)))
}

fn unpack(zip_path: &Path, dest_dir: &Path, ui: &mut impl Ui) -> Result<usize> {
    let file = File::open(zip_path)
        .with_context(|| format!("Failed to open zip file {:?}", zip_path))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).context("Failed to read zip archive")?;

    fs::create_dir_all(dest_dir).context("Failed to create destination directory")?;

    let total = archive.len() as u64;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .context("Failed to read file from archive")?;
        ui.set_progress(i as u64 + 1, total, "extracting");

        // Only the final component is used, so entries cannot escape dest_dir
        let file_name = match Path::new(entry.name()).file_name().and_then(|n| n.to_str()) {
            Some(name) if name.ends_with(".jsonl") && entry.is_file() => name.to_string(),
            _ => continue,
        };

        let dest_path = dest_dir.join(&file_name);
        let mut dest_file = File::create(&dest_path)
            .with_context(|| format!("Failed to create file: {:?}", dest_path))?;
        io::copy(&mut entry, &mut dest_file)
            .with_context(|| format!("Failed to extract: {}", file_name))?;

        written += 1;
    }

    Ok(written)
}
