//! Decoding raw file bytes into searchable text.
//!
//! UTF-8 is the fast path. UTF-16 is recognised by its BOM. Anything else is
//! either rejected or, with transcoding enabled, run through `chardetng` to
//! guess a legacy encoding and decoded with `encoding_rs`.

use super::CorpusReadError;
use crate::utils::is_binary_content;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode file bytes into a `String`.
///
/// A UTF-8 BOM is dropped but not trusted: bytes after it still go through
/// the binary sniff and, when invalid, the transcoding fallback.
pub fn decode_text(bytes: &[u8], path: &Path, transcode: bool) -> Result<String, CorpusReadError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    // UTF-16 is full of NUL bytes, so the BOM check must come before sniffing.
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            return Err(CorpusReadError::NotUtf8 {
                path: path.to_path_buf(),
            });
        }
        return Ok(text.into_owned());
    }

    if is_binary_content(bytes) {
        return Err(CorpusReadError::Binary {
            path: path.to_path_buf(),
        });
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_owned());
    }

    if !transcode {
        return Err(CorpusReadError::NotUtf8 {
            path: path.to_path_buf(),
        });
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        tracing::debug!(
            path = %path.display(),
            encoding = encoding.name(),
            "Transcoded with replacement characters"
        );
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        let text = decode_text("héllo\nworld".as_bytes(), Path::new("a.txt"), true).unwrap();
        assert_eq!(text, "héllo\nworld");
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let text = decode_text(b"\xEF\xBB\xBFfoo", Path::new("a.txt"), false).unwrap();
        assert_eq!(text, "foo");
    }

    #[test]
    fn test_utf8_bom_with_latin1_body_is_transcoded() {
        let bytes: &[u8] = b"\xEF\xBB\xBFcaf\xE9 au lait";
        let err = decode_text(bytes, Path::new("menu.txt"), false).unwrap_err();
        assert!(matches!(err, CorpusReadError::NotUtf8 { .. }));

        let text = decode_text(bytes, Path::new("menu.txt"), true).unwrap();
        assert!(text.starts_with("caf"));
        assert!(text.ends_with(" au lait"));
        assert!(!text.starts_with('\u{FEFF}'));
    }

    #[test]
    fn test_utf16le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "foo bar".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let text = decode_text(&bytes, Path::new("wide.txt"), false).unwrap();
        assert_eq!(text, "foo bar");
    }

    #[test]
    fn test_binary_is_rejected() {
        let err = decode_text(b"\x7fELF\0\0\x01", Path::new("a.out"), true).unwrap_err();
        assert!(err.is_binary());
    }

    #[test]
    fn test_latin1_requires_transcoding() {
        let latin1: &[u8] = &[0x63, 0x61, 0x66, 0xE9]; // "café"
        let err = decode_text(latin1, Path::new("latin1.txt"), false).unwrap_err();
        assert!(matches!(err, CorpusReadError::NotUtf8 { .. }));

        let text = decode_text(latin1, Path::new("latin1.txt"), true).unwrap();
        assert!(text.starts_with("caf"));
    }

    #[test]
    fn test_shift_jis_is_transcoded() {
        let original = "日本語のテストです。これは日本語のテキストです。";
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(original);
        let text = decode_text(&encoded, Path::new("sjis.txt"), true).unwrap();
        assert!(text.contains("日本語"));
    }
}
