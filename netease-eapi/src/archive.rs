//! In-memory zip archives for log uploads.

use crate::error::Result;
use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Deflate each `(name, data)` pair into a single zip archive.
///
/// Entries are written in iteration order. No zip64, no encryption.
pub fn compress<N, D>(files: impl IntoIterator<Item = (N, D)>) -> Result<Vec<u8>>
where
    N: AsRef<str>,
    D: AsRef<[u8]>,
{
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(false);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(name.as_ref(), options)?;
        zip.write_all(data.as_ref())?;
    }
    Ok(zip.finish()?.into_inner())
}
