//! Persisting raw frames for training-set collection.

use crate::{Error, Result};
use opencv::{core::Mat, core::Vector, imgcodecs, prelude::*};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Storage for captured frames
pub trait CaptureSink {
    /// Persist `frame`, returning where it was written
    ///
    /// # Errors
    ///
    /// Returns an error if the frame could not be written
    fn save(&mut self, frame: &Mat) -> Result<PathBuf>;
}

/// Writes each capture as an image file named after the current time
#[derive(Debug, Clone)]
pub struct DiskCaptureSink {
    directory: PathBuf,
    extension: String,
}

impl DiskCaptureSink {
    /// Create a sink writing into `directory`, creating it if needed.
    ///
    /// `extension` selects the image codec (`jpg`, `png`, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the extension is empty
    pub fn new<P: AsRef<Path>>(directory: P, extension: &str) -> Result<Self> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(Error::InvalidInput("Capture extension must not be empty".to_string()));
        }
        std::fs::create_dir_all(directory.as_ref())?;
        log::info!("Saving captures to {}", directory.as_ref().display());
        Ok(Self {
            directory: directory.as_ref().to_path_buf(),
            extension: extension.to_string(),
        })
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Next unused path of the form `Captured_<secs>.<micros>.<ext>`, with a
    /// `_<n>` suffix if two saves land in the same microsecond
    fn next_path(&self) -> PathBuf {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let stem = format!("Captured_{}.{:06}", elapsed.as_secs(), elapsed.subsec_micros());

        let mut path = self.directory.join(format!("{stem}.{}", self.extension));
        let mut suffix = 1;
        while path.exists() {
            path = self.directory.join(format!("{stem}_{suffix}.{}", self.extension));
            suffix += 1;
        }
        path
    }
}

impl CaptureSink for DiskCaptureSink {
    fn save(&mut self, frame: &Mat) -> Result<PathBuf> {
        if frame.empty() {
            return Err(Error::Capture("Refusing to save an empty frame".to_string()));
        }
        let path = self.next_path();
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Capture(format!("Non UTF-8 capture path: {}", path.display())))?;

        if !imgcodecs::imwrite(path_str, frame, &Vector::new())? {
            return Err(Error::Capture(format!("Failed to write {}", path.display())));
        }
        Ok(path)
    }
}

/// Per-session counters owned by the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounters {
    captures: u64,
}

impl SessionCounters {
    /// Number of frames saved so far
    #[must_use]
    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Record one successful save and return the new total
    pub fn record_capture(&mut self) -> u64 {
        self.captures += 1;
        self.captures
    }
}
