use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// File whose presence marks a dataset directory as completely extracted
const MARKER_FILE: &str = "pokemon.jsonl";

/// Subdirectory for archives given on the command line; never cleaned up
const LOCAL_DIR: &str = "local";

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let cache_dir = match custom_dir {
            Some(dir) => dir,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "porydex-db")
                    .context("Could not determine cache directory")?;
                proj_dirs.cache_dir().to_path_buf()
            }
        };

        fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;

        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Directory the dataset named `name` is extracted into
    pub fn dataset_dir(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    /// Directory a local archive named `name` is extracted into
    pub fn local_dataset_dir(&self, name: &str) -> PathBuf {
        self.cache_dir.join(LOCAL_DIR).join(name)
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.dataset_dir(name).join(MARKER_FILE).exists()
    }

    pub fn zip_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.zip", name))
    }

    /// Remove every downloaded dataset directory except `keep`. Extractions of
    /// local archives are left alone.
    pub fn cleanup_other_datasets(&self, keep: &str) -> Result<()> {
        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            let is_other = path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n != keep && n != LOCAL_DIR)
                    .unwrap_or(false);
            if is_other && path.join(MARKER_FILE).exists() {
                fs::remove_dir_all(&path)
                    .with_context(|| format!("Failed to remove {:?}", path))?;
            }
        }
        Ok(())
    }
}

/// Cache key for a dataset archive: the last URL path segment without its
/// extension, restricted to characters safe in a directory name
pub fn dataset_name(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let stem = segment.strip_suffix(".zip").unwrap_or(segment);

    let name: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        "dataset".to_string()
    } else {
        name
    }
}
