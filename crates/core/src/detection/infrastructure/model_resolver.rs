use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelFetchError {
    #[error("could not determine model cache directory")]
    NoCacheDir,
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Download progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 when the server sent no Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model by file name and URL: reuse the cached copy if present,
/// otherwise download into the cache.
pub fn resolve(
    name: &str,
    url: &str,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelFetchError> {
    let cache_dir = model_cache_dir()?;
    let cached = cache_dir.join(name);
    if cached.exists() {
        log::debug!("model cache hit: {}", cached.display());
        return Ok(cached);
    }

    fs::create_dir_all(&cache_dir).map_err(ModelFetchError::CacheDir)?;
    download(url, &cached, progress)?;
    Ok(cached)
}

/// Per-platform model cache directory (`.../Framesight/models`).
pub fn model_cache_dir() -> Result<PathBuf, ModelFetchError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("Framesight").join("models"))
        .ok_or(ModelFetchError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelFetchError> {
    let response = reqwest::blocking::get(url).map_err(|e| ModelFetchError::Download {
        url: url.to_string(),
        source: e,
    })?;
    let total = response.content_length().unwrap_or(0);

    // Download into a .part file and rename so a failed fetch never
    // leaves a truncated model in the cache.
    let temp_path = dest.with_extension("part");
    let mut file = fs::File::create(&temp_path).map_err(|e| ModelFetchError::Write {
        path: temp_path.clone(),
        source: e,
    })?;

    let bytes = response.bytes().map_err(|e| ModelFetchError::Download {
        url: url.to_string(),
        source: e,
    })?;

    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(|e| ModelFetchError::Write {
            path: temp_path.clone(),
            source: e,
        })?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(|e| ModelFetchError::Write {
        path: temp_path.clone(),
        source: e,
    })?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|e| ModelFetchError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_dir_under_app_folder() {
        let dir = model_cache_dir().unwrap();
        assert!(dir.to_string_lossy().contains("Framesight"));
        assert!(dir.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_failed_download_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let _ = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
