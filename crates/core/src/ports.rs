use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use crate::domain::ObjectLocation;
use crate::error::SegmentError;

pub type Result<T> = std::result::Result<T, SegmentError>;

/// Reads whole objects out of object storage
#[async_trait]
pub trait ObjectReader: Send + Sync {
    /// Fails with `StorageRead` when the object is missing or not readable
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>>;
}

/// Uploads a local file to object storage
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    async fn upload_file(&self, path: &Path, location: &ObjectLocation) -> Result<()>;
}

/// Writes segment members to a local file the uploader can pick up.
/// This is a port (interface) between the importer and the file format adapter.
pub trait SegmentFileWriter: Send + Sync {
    /// Writes the file and returns where it landed
    fn write(&self, segment_name: &str, endpoints: &[String]) -> Result<PathBuf>;

    fn discard(&self, path: &Path) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the execution environment's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
