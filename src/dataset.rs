//! DRIVE-style retinal dataset access.
//!
//! A dataset root holds one image directory per split:
//!
//! ```text
//! DRIVE/
//! ├── training/images/   21_training.tif, 22_training.tif, ...
//! └── test/images/       01_test.tif, 02_test.tif, ...
//! ```
//!
//! Only the `images` directories are read. Listings are sorted by file name
//! and restricted to extensions the codec can decode; hidden files are skipped.
//! Every image is loaded as a single-channel [`PixelBuffer`].

use crate::imaging::{CodecError, ImageCodec, PixelBuffer, is_supported_input};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Dataset root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Split directory not found: {0}")]
    MissingSplit(PathBuf),
    #[error("Unknown split '{0}' (expected 'training' or 'test')")]
    UnknownSplit(String),
    #[error("Failed to load {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

/// One of the two dataset partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Training,
    Test,
}

impl Split {
    pub fn name(self) -> &'static str {
        match self {
            Split::Training => "training",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Split {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" => Ok(Split::Training),
            "test" => Ok(Split::Test),
            other => Err(DatasetError::UnknownSplit(other.to_string())),
        }
    }
}

/// Handle to a dataset root on disk.
#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
}

impl Dataset {
    /// Open a dataset rooted at `root`. The split directories are checked
    /// lazily, when first listed or read.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DatasetError::RootNotFound(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<split>/images`
    pub fn images_dir(&self, split: Split) -> PathBuf {
        self.root.join(split.name()).join("images")
    }

    pub fn image_path(&self, split: Split, name: &str) -> PathBuf {
        self.images_dir(split).join(name)
    }

    /// Sorted file names of the decodable images in a split.
    pub fn list(&self, split: Split) -> Result<Vec<String>, DatasetError> {
        let dir = self.images_dir(split);
        if !dir.is_dir() {
            return Err(DatasetError::MissingSplit(dir));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type().is_file()
                && !name.starts_with('.')
                && is_supported_input(entry.path())
            {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Decode one image of a split as grayscale.
    ///
    /// The header is read first so an unreadable file fails before any pixel
    /// data is decoded.
    pub fn load_image(
        &self,
        codec: &impl ImageCodec,
        split: Split,
        name: &str,
    ) -> Result<PixelBuffer, DatasetError> {
        let path = self.image_path(split, name);
        let dims = match codec.identify(&path) {
            Ok(dims) => dims,
            Err(source) => return Err(DatasetError::Codec { path, source }),
        };
        tracing::debug!("Loading {split}/{name} ({}x{})", dims.width, dims.height);
        codec
            .decode_file(&path)
            .map_err(|source| DatasetError::Codec { path, source })
    }

    /// Decode several images, skipping (and logging) any that fail.
    ///
    /// Returned pairs keep the order of `names`.
    pub fn load_batch<S: AsRef<str>>(
        &self,
        codec: &impl ImageCodec,
        split: Split,
        names: &[S],
    ) -> Vec<(String, PixelBuffer)> {
        names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                match self.load_image(codec, split, name) {
                    Ok(buffer) => Some((name.to_string(), buffer)),
                    Err(e) => {
                        tracing::warn!("Skipping {name}: {e}");
                        None
                    }
                }
            })
            .collect()
    }

    /// Decode every listed image of a split.
    pub fn load_split(
        &self,
        codec: &impl ImageCodec,
        split: Split,
    ) -> Result<Vec<(String, PixelBuffer)>, DatasetError> {
        let names = self.list(split)?;
        Ok(self.load_batch(codec, split, &names))
    }
}
