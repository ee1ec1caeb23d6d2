// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Asset discovery for recorded samples.
//!
//! The engine never decodes audio itself. An [`Asset`] is an opaque handle that the playback
//! device knows how to render; this module only finds candidate files on disk.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::LoadError;

/// File extensions considered to be recorded samples.
const AUDIO_EXTENSIONS: [&str; 6] = ["wav", "flac", "ogg", "mp3", "aif", "aiff"];

/// A handle to a recorded audio asset.
/// Cloning is cheap (reference counted), so voices can hold one without allocating.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    /// The asset name, used to parse the sample tag.
    name: Arc<str>,
    /// Where the playback device can find the asset.
    path: Arc<Path>,
}

impl Asset {
    /// Creates a new asset with the given name and location.
    pub fn new(name: &str, path: &Path) -> Asset {
        Asset {
            name: Arc::from(name),
            path: Arc::from(path),
        }
    }

    /// Creates an asset that is identified by name only.
    pub fn named(name: &str) -> Asset {
        Asset::new(name, Path::new(name))
    }

    /// Creates an asset from a file path, named after the file stem.
    pub fn from_path(path: &Path) -> Option<Asset> {
        let stem = path.file_stem()?.to_str()?;
        Some(Asset::new(stem, path))
    }

    /// Returns the asset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the asset location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Returns true if the path looks like an audio file.
fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Recurses into the given directory and returns every audio file found, sorted by path.
pub fn scan(dir: &Path) -> Result<Vec<Asset>, LoadError> {
    let mut paths = Vec::new();
    collect_paths(dir, &mut paths)?;
    paths.sort();

    let assets: Vec<Asset> = paths
        .iter()
        .filter_map(|p| {
            let asset = Asset::from_path(p);
            if asset.is_none() {
                warn!(path = ?p, "Skipping sample with a non UTF-8 name");
            }
            asset
        })
        .collect();
    info!(
        path = ?dir,
        assets = assets.len(),
        "Scanned sample directory"
    );
    Ok(assets)
}

fn collect_paths(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();

        // Symlinked directories are not followed.
        if entry.file_type().map_err(io_error)?.is_dir() {
            collect_paths(&path, paths)?;
        } else if is_audio_file(&path) {
            paths.push(path);
        } else {
            debug!(path = ?path, "Ignoring non-audio file");
        }
    }

    Ok(())
}
