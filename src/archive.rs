use std::fs::{self, File};
use std::io;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use tempfile::TempPath;

use crate::error::{NotifierError, Result};

/// A compressed copy of a report in a scratch file. The file is deleted when
/// this value drops.
#[derive(Debug)]
pub struct Archive {
    path: TempPath,
    file_name: String,
}

impl Archive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name presented to the ticketing API, derived from the report name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Compress a report into a scratch file.
///
/// A directory becomes `<dir>.tar.gz` holding `<dir>/...`; a single file
/// becomes `<file>.gz`. Nothing is written next to the report.
pub fn compress(source: &Path) -> Result<Archive> {
    let metadata = fs::metadata(source)?;
    // Path::file_name ignores a trailing separator, so `reports/` yields `reports`.
    let name = source.file_name().ok_or_else(|| {
        NotifierError::Config(format!("Cannot archive {}", source.display()))
    })?;

    let suffix = if metadata.is_dir() { ".tar.gz" } else { ".gz" };
    let (file, path) = tempfile::Builder::new()
        .prefix("ci-notify-")
        .suffix(suffix)
        .tempfile()?
        .into_parts();

    let encoder = GzEncoder::new(file, Compression::default());
    let file = if metadata.is_dir() {
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all(name, source)?;
        builder.into_inner()?.finish()?
    } else {
        let mut encoder = encoder;
        io::copy(&mut File::open(source)?, &mut encoder)?;
        encoder.finish()?
    };
    file.sync_all()?;

    let archive = Archive {
        path,
        file_name: format!("{}{suffix}", name.to_string_lossy()),
    };
    debug!(
        "Compressed {} into {}",
        source.display(),
        archive.path().display()
    );
    Ok(archive)
}
