//! Source resolution for the transport thread.
//!
//! Podcast audio lives behind HTTP URLs while rodio wants a local file, so
//! remote sources are downloaded once into the cache directory and reused
//! on later loads. Local paths and `file://` URLs pass straight through.

use std::fs::{self, File};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) fn http_client() -> Option<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .ok()
}

/// Turn a media locator into a playable local path, downloading if needed.
pub(super) fn resolve_source(
    client: Option<&reqwest::blocking::Client>,
    url: &str,
    cache_dir: &Path,
) -> Result<PathBuf, String> {
    if let Some(rest) = url.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        // Bare paths are accepted so local files work without a scheme.
        return Ok(PathBuf::from(url));
    }

    let target = cache_dir.join(cache_file_name(url));
    if target.is_file() {
        debug!(%url, path = %target.display(), "using cached source");
        return Ok(target);
    }

    let Some(client) = client else {
        return Err("http client unavailable".to_string());
    };

    fs::create_dir_all(cache_dir)
        .map_err(|e| format!("cache dir {}: {e}", cache_dir.display()))?;

    let mut response = client.get(url).send().map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("server returned {}", response.status()));
    }

    // Download under a temp name so a partial file is never mistaken for a
    // cached source.
    let partial = target.with_extension("partial");
    let mut file = File::create(&partial).map_err(|e| format!("{}: {e}", partial.display()))?;
    response.copy_to(&mut file).map_err(|e| e.to_string())?;
    fs::rename(&partial, &target).map_err(|e| e.to_string())?;

    debug!(%url, path = %target.display(), "downloaded source");
    Ok(target)
}

/// Cache file name for a URL: hash of the full URL, keeping the extension
/// of the path segment when it has a sane one.
pub(super) fn cache_file_name(url: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    let digest = hasher.finish();

    let path_part = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path_part
        .rsplit('/')
        .next()
        .and_then(|seg| seg.rsplit_once('.'))
        .map(|(_, e)| e)
        .filter(|e| !e.is_empty() && e.len() <= 4 && e.chars().all(|c| c.is_ascii_alphanumeric()));

    match ext {
        Some(e) => format!("{digest:016x}.{e}"),
        None => format!("{digest:016x}.audio"),
    }
}
