//! ZIP packaging of generated QR code images.
//!
//! Archives are built fully in memory; every entry is DEFLATE-compressed.
//! Items without an image payload are skipped with a warning instead of failing
//! the whole archive.

use std::io::{Cursor, Seek, SeekFrom, Write};

use tracing::warn;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Maximum length, in characters, of a cleaned filename fragment.
const MAX_CLEAN_LEN: usize = 100;

#[derive(Debug, thiserror::Error)]
#[error("Error creating ZIP file: {0}")]
pub struct ArchiveError(String);

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        Self(err.to_string())
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        Self(err.to_string())
    }
}

/// An ad hoc archive entry.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Entry name; `qrcode_NNN.png` (1-based) is used when absent.
    pub filename: Option<String>,
    pub bytes: Option<Vec<u8>>,
}

/// A stored batch member to be archived.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// 0-based position of the member within its batch.
    pub position: u32,
    pub url: String,
    pub bytes: Option<Vec<u8>>,
}

/// Progress callback receiving `(processed, total)`.
pub type Progress<'a> = &'a mut dyn FnMut(usize, usize);

/// Replace characters other than word characters, `-` and `.` with `_`,
/// collapse runs of `_`, and cap the result at 100 characters.
pub fn clean_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.chars().take(MAX_CLEAN_LEN).collect()
}

/// Archive entry name for a stored batch member.
pub fn stored_entry_name(position: u32, url: &str) -> String {
    format!("qr_{:03}_{}.png", position + 1, clean_filename(url))
}

/// Pack ad hoc entries into a ZIP archive.
pub fn pack_entries(
    entries: Vec<ArchiveEntry>,
    mut progress: Option<Progress<'_>>,
) -> Result<Vec<u8>, ArchiveError> {
    let total = entries.len();
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (i, entry) in entries.into_iter().enumerate() {
        let name = entry
            .filename
            .unwrap_or_else(|| format!("qrcode_{:03}.png", i + 1));
        match entry.bytes {
            Some(bytes) => write_entry(&mut zip, &name, &bytes)?,
            None => warn!(entry = %name, "Skipping archive entry without image data"),
        }

        if let Some(report) = progress.as_mut() {
            report(i + 1, total);
        }
    }

    finish(zip)
}

/// Pack stored batch members into a ZIP archive, naming entries by position
/// and URL.
pub fn pack_stored(items: Vec<StoredImage>) -> Result<Vec<u8>, ArchiveError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for item in items {
        let name = stored_entry_name(item.position, &item.url);
        match item.bytes {
            Some(bytes) => write_entry(&mut zip, &name, &bytes)?,
            None => warn!(url = %item.url, "Skipping batch member without stored image"),
        }
    }

    finish(zip)
}

fn write_entry<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
) -> Result<(), ArchiveError> {
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    zip.start_file(name, options)?;
    zip.write_all(bytes)?;
    Ok(())
}

fn finish(zip: ZipWriter<Cursor<Vec<u8>>>) -> Result<Vec<u8>, ArchiveError> {
    let mut cursor = zip.finish()?;
    cursor.seek(SeekFrom::Start(0))?;
    Ok(cursor.into_inner())
}
