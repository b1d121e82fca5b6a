//! Utility functions shared across modules

use std::path::Path;

/// Binary file extensions whose content is never read. Such files are still
/// listed, so their names can match.
pub const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "bin", "o", "a", "lib", // Executables and libraries
    "png", "jpg", "jpeg", "gif", "ico", "bmp", "webp", // Images
    "zip", "tar", "gz", "7z", "rar", "xz", "bz2", // Archives
    "woff", "woff2", "ttf", "eot", "otf", // Fonts
    "pdf", "doc", "docx", "xls", "xlsx", // Documents
    "mp3", "mp4", "wav", "avi", "mkv", "mov", // Media
    "pyc", "pyo", "class", // Compiled bytecode
];

/// Check if a file should be skipped based on its extension.
pub fn has_binary_extension(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        BINARY_EXTENSIONS.contains(&ext.as_str())
    } else {
        false
    }
}

/// Samples shorter than this are judged by the NUL check alone.
const MIN_RATIO_SAMPLE: usize = 64;

/// Check if raw file bytes appear to be binary.
///
/// Only the first 8KB is inspected:
/// - A NUL byte is a strong indicator of binary content
/// - More than 10% control bytes (other than tab/CR/LF/FF) suggests binary
///   content, once the sample is at least 64 bytes
///
/// UTF-16 text is full of NUL bytes, so callers must check for a UTF-16 BOM
/// before calling this.
pub fn is_binary_content(content: &[u8]) -> bool {
    let check_len = content.len().min(8192);
    let sample = &content[..check_len];

    if memchr::memchr(0, sample).is_some() {
        return true;
    }

    if check_len < MIN_RATIO_SAMPLE {
        return false;
    }

    let non_text_count = sample
        .iter()
        .filter(|&&byte| byte < 32 && !matches!(byte, b'\t' | b'\n' | b'\r' | 0x0c))
        .count();

    non_text_count * 10 > check_len
}

/// Format bytes for human readability (e.g., 1048576 -> "1.00 MB")
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.2} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Render `path` relative to `base` with forward slashes.
///
/// Falls back to the full path when `path` is not under `base`.
pub fn display_relative_path(path: &Path, base: Option<&Path>) -> String {
    let relative = base
        .and_then(|base| path.strip_prefix(base).ok())
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// The final component of a path, or the whole path if it has none.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
