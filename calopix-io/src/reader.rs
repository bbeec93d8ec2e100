//! Event file readers.
//!

use crate::event::{EventData, RawEvent, DEFAULT_COLLECTION};
use crate::{Error, Result};
use log::debug;
use memmap2::Mmap;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// Uses memmap2 to efficiently access file contents without
/// loading the entire file into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, is empty or cannot be
    /// memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        if file.metadata()?.len() == 0 {
            return Err(Error::InvalidFormat(format!(
                "{} is empty",
                path.as_ref().display()
            )));
        }
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path of the mapped file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Supported event file layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFileFormat {
    /// `{"collection": ..., "events": [{"x": [..], "y": [..], "z": [..], "energy": [..]}]}`
    Json,
    /// One group per collection with flat `x`, `y`, `z`, `energy` and
    /// `hits_per_event` datasets.
    Hdf5,
}

impl EventFileFormat {
    /// Detects the format from the file extension.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedFormat`] for unknown extensions.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "h5" | "hdf5" => Ok(Self::Hdf5),
            _ => Err(Error::UnsupportedFormat(format!(
                "{} (expected .json, .h5 or .hdf5)",
                path.display()
            ))),
        }
    }
}

#[derive(Deserialize)]
struct JsonEventFile {
    #[serde(default)]
    collection: Option<String>,
    events: Vec<RawEvent>,
}

/// Reader for structured event files.
#[derive(Debug, Clone)]
pub struct EventFileReader {
    path: PathBuf,
    format: EventFileFormat,
}

impl EventFileReader {
    /// Prepares to read `path`, detecting the format from its extension.
    ///
    /// # Errors
    /// Returns an error for unknown extensions or when the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = EventFileFormat::from_path(&path)?;
        if !path.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        Ok(Self { path, format })
    }

    /// Detected file format.
    pub fn format(&self) -> EventFileFormat {
        self.format
    }

    /// Path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every event of the file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be decoded or an event's arrays
    /// disagree in length.
    pub fn read(&self) -> Result<EventData> {
        let data = match self.format {
            EventFileFormat::Json => self.read_json()?,
            EventFileFormat::Hdf5 => self.read_hdf5()?,
        };
        debug!(
            "{}: {} events, {} hits in {}",
            self.path.display(),
            data.num_events(),
            data.total_hits(),
            data.collection()
        );
        Ok(data)
    }

    fn read_json(&self) -> Result<EventData> {
        let mapped = MappedFileReader::open(&self.path)?;
        let file: JsonEventFile = serde_json::from_slice(mapped.as_bytes())?;
        let collection = file
            .collection
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        EventData::from_events(collection, file.events)
    }

    #[cfg(feature = "hdf5")]
    fn read_hdf5(&self) -> Result<EventData> {
        crate::hdf5::read_events_hdf5(&self.path, DEFAULT_COLLECTION)
    }

    #[cfg(not(feature = "hdf5"))]
    #[allow(clippy::unnecessary_wraps)]
    fn read_hdf5(&self) -> Result<EventData> {
        Err(Error::UnsupportedFormat(format!(
            "{} (built without the `hdf5` feature)",
            self.path.display()
        )))
    }
}
