use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use segment_core::error::SegmentError;
use segment_core::ports::{Result, SegmentFileWriter};
use tracing::debug;

/// Header of the single column in a segment import file
pub const ID_HEADER: &str = "Id";

/// Writes segment import files as single-column CSV
pub struct CsvSegmentWriter {
    work_dir: PathBuf,
}

impl CsvSegmentWriter {
    /// Creates a writer placing files under `work_dir`
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn path_for(&self, segment_name: &str) -> PathBuf {
        self.work_dir.join(format!("{}.csv", segment_name))
    }
}

impl SegmentFileWriter for CsvSegmentWriter {
    fn write(&self, segment_name: &str, endpoints: &[String]) -> Result<PathBuf> {
        fs::create_dir_all(&self.work_dir)
            .map_err(|e| SegmentError::local_io(&self.work_dir, e))?;

        let path = self.path_for(segment_name);
        let to_local_io = |e: csv::Error| SegmentError::local_io(&path, io::Error::from(e));

        // The writer owns the file handle; it is closed when it goes out of scope
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .map_err(to_local_io)?;

        writer.write_record([ID_HEADER]).map_err(to_local_io)?;
        for endpoint in endpoints {
            writer.write_record([endpoint]).map_err(to_local_io)?;
        }
        writer
            .flush()
            .map_err(|e| SegmentError::local_io(&path, e))?;

        debug!(path = %path.display(), rows = endpoints.len(), "Wrote segment CSV");
        Ok(path)
    }

    fn discard(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SegmentError::local_io(path, e)),
        }
    }
}
