use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::StorageError;

/// Builds a zip archive with one flat entry per `(name, content)` pair.
///
/// Entries carry the fixed DOS epoch as their modification time so the same
/// inputs always produce the same archive bytes.
pub fn build_zip<'a, I>(entries: I, archive_path: &Path) -> Result<Vec<u8>, StorageError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let to_error = |source: zip::result::ZipError| StorageError::Archive {
        path: archive_path.to_path_buf(),
        source,
    };

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(name, options).map_err(to_error)?;
        writer
            .write_all(content)
            .map_err(|e| to_error(zip::result::ZipError::Io(e)))?;
    }

    let cursor = writer.finish().map_err(to_error)?;
    Ok(cursor.into_inner())
}
