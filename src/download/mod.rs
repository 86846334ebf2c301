pub mod cache;
pub mod client;
pub mod extract;

pub use cache::*;
pub use client::*;
pub use extract::*;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::ui::{Phase, Ui};

/// Download and extract the dataset at `url` unless it is already cached.
/// Returns the directory holding its JSONL files.
pub fn ensure_dataset(
    url: &str,
    cache_dir: Option<PathBuf>,
    force: bool,
    ui: &mut impl Ui,
) -> Result<PathBuf> {
    let cache = CacheManager::new(cache_dir)?;
    let name = dataset_name(url);
    let dataset_dir = cache.dataset_dir(&name);

    if cache.is_cached(&name) && !force {
        info!(dataset = %name, dir = %dataset_dir.display(), "using cached dataset");
        ui.log(format!("Dataset {} already cached", name));
        return Ok(dataset_dir);
    }

    ui.set_phase(Phase::Fetching);
    ui.set_info(format!("Downloading {}", url));
    let zip_path = cache.zip_path(&name);
    DatasetClient::new()?.download_archive(url, &zip_path, ui)?;

    ui.set_phase(Phase::Extracting);
    extract_zip(&zip_path, &dataset_dir, ui)?;
    std::fs::remove_file(&zip_path).ok();

    if !cache.is_cached(&name) {
        bail!("Archive at {} does not contain pokemon.jsonl", url);
    }
    cache.cleanup_other_datasets(&name)?;

    Ok(dataset_dir)
}

/// Accept either a dataset directory or a `.zip` archive of one; archives
/// are extracted into the cache's `local/` area first, replacing any earlier
/// extraction of an archive with the same name
pub fn prepare_input(input: &Path, cache_dir: Option<PathBuf>, ui: &mut impl Ui) -> Result<PathBuf> {
    if input.is_dir() {
        return Ok(input.to_path_buf());
    }

    let is_zip = input
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);
    if !is_zip {
        bail!("{:?} is neither a directory nor a .zip archive", input);
    }

    let cache = CacheManager::new(cache_dir)?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Archive name is not valid UTF-8")?;
    let dest = cache.local_dataset_dir(&dataset_name(stem));

    ui.set_phase(Phase::Extracting);
    extract_zip(input, &dest, ui)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::SilentUi;
    use std::fs::{self, File};
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_dataset_zip(path: &Path, files: &[&str]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for name in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(b"{}").unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_local_archive_replaces_previous_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let archive = dir.path().join("data.zip");

        write_dataset_zip(&archive, &["pokemon.jsonl", "game_pokemon_forms.jsonl"]);
        let first = prepare_input(&archive, Some(cache_dir.clone()), &mut SilentUi::new()).unwrap();
        assert!(first.join("game_pokemon_forms.jsonl").exists());

        write_dataset_zip(&archive, &["pokemon.jsonl"]);
        let second = prepare_input(&archive, Some(cache_dir.clone()), &mut SilentUi::new()).unwrap();

        assert_eq!(first, second);
        assert!(second.join("pokemon.jsonl").exists());
        assert!(!second.join("game_pokemon_forms.jsonl").exists());
    }

    #[test]
    fn test_local_extraction_survives_download_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let archive = dir.path().join("data.zip");
        write_dataset_zip(&archive, &["pokemon.jsonl"]);

        let local = prepare_input(&archive, Some(cache_dir.clone()), &mut SilentUi::new()).unwrap();
        assert!(local.starts_with(cache_dir.join("local")));

        let cache = CacheManager::new(Some(cache_dir)).unwrap();
        fs::create_dir_all(cache.dataset_dir("release-1")).unwrap();
        fs::write(cache.dataset_dir("release-1").join("pokemon.jsonl"), "").unwrap();
        cache.cleanup_other_datasets("release-1").unwrap();

        assert!(local.join("pokemon.jsonl").exists());
    }

    #[test]
    fn test_directory_input_is_used_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let input = prepare_input(dir.path(), None, &mut SilentUi::new()).unwrap();
        assert_eq!(input, dir.path());
    }

    #[test]
    fn test_other_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pokemon.jsonl");
        fs::write(&file, "").unwrap();
        assert!(prepare_input(&file, Some(dir.path().join("cache")), &mut SilentUi::new()).is_err());
    }
}
