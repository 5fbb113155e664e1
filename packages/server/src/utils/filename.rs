/// Extension accepted for spreadsheet uploads.
pub const SPREADSHEET_EXTENSION: &str = "xlsx";

/// Reasons an uploaded spreadsheet filename is refused.
#[derive(Debug, PartialEq, Eq)]
pub enum UploadNameError {
    /// No filename was sent with the `file` part.
    Missing,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
    /// Extension is not `.xlsx`.
    UnsupportedExtension,
}

impl UploadNameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Missing => "File is required",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::UnsupportedExtension => "Only .xlsx files are supported",
        }
    }
}

/// Check the client-supplied name of a spreadsheet upload. The extension is
/// matched case-insensitively; the path part, if any, is ignored.
pub fn validate_spreadsheet_name(filename: &str) -> Result<&str, UploadNameError> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(UploadNameError::Missing);
    }

    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(UploadNameError::ControlCharacter);
    }

    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.eq_ignore_ascii_case(SPREADSHEET_EXTENSION) => {
            Ok(base)
        }
        _ => Err(UploadNameError::UnsupportedExtension),
    }
}

/// Attachment name of a single QR code download.
pub fn qrcode_download_name(id: &str) -> String {
    format!("{id}.png")
}

/// Attachment name of a batch archive download.
pub fn batch_archive_name(batch_id: &str) -> String {
    format!("{batch_id}_qrcodes.zip")
}

/// Build a safe `Content-Disposition` header value.
pub fn content_disposition_value(disposition: &str, filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("{disposition}; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
