// ==========================================
// Schedule Import - encoding detection
// ==========================================
// BOM -> strict UTF-8 -> statistical guess (chardetng).
// Never fails: an inconclusive guess decodes as lossy UTF-8.
// ==========================================

use crate::importer::error::PipelineResult;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Decoded file content plus the encoding that produced it
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
}

impl DecodedText {
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Detect the byte encoding of `bytes` and decode to text
pub fn detect_and_decode(bytes: &[u8]) -> DecodedText {
    // 1. explicit BOM
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            warn!(encoding = encoding.name(), "BOM-declared encoding had malformed sequences");
        }
        debug!(encoding = encoding.name(), "encoding taken from BOM");
        return DecodedText {
            text: text.into_owned(),
            encoding,
        };
    }

    // 2. already valid UTF-8
    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: UTF_8,
        };
    }

    // 3. statistical guess
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guessed = detector.guess(None, true);

    let (text, had_errors) = guessed.decode_without_bom_handling(bytes);
    if !had_errors {
        debug!(encoding = guessed.name(), "encoding detected");
        return DecodedText {
            text: text.into_owned(),
            encoding: guessed,
        };
    }

    // 4. inconclusive: default encoding, replacement characters accepted
    warn!(
        guessed = guessed.name(),
        "encoding detection inconclusive, decoding as UTF-8"
    );
    let (text, _) = UTF_8.decode_without_bom_handling(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: UTF_8,
    }
}

/// Read the whole file into memory
///
/// The handle is released on every exit path, including read failures.
pub fn read_file_bytes(path: &Path) -> PipelineResult<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::PipelineError;
    use encoding_rs::{UTF_16LE, WINDOWS_1251};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_plain_utf8() {
        let decoded = detect_and_decode("Предмет,День\nMath,Monday".as_bytes());
        assert_eq!(decoded.encoding, UTF_8);
        assert!(decoded.text.starts_with("Предмет"));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Subject,Day");
        let decoded = detect_and_decode(&bytes);
        assert_eq!(decoded.encoding, UTF_8);
        assert_eq!(decoded.text, "Subject,Day");
    }

    #[test]
    fn test_utf16_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Day;Room".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = detect_and_decode(&bytes);
        assert_eq!(decoded.encoding, UTF_16LE);
        assert_eq!(decoded.text, "Day;Room");
    }

    #[test]
    fn test_windows_1251_detected() {
        let source = "Предмет;День недели;Время начала;Время окончания;Аудитория\n\
                      Математика;Понедельник;09:00;10:30;305\n\
                      Русский язык;Вторник;11:00;12:30;412\n\
                      Литература;Среда;13:00;14:30;101\n\
                      История России;Четверг;08:30;10:00;210\n\
                      Физическая культура;Пятница;10:00;11:30;спортзал\n";
        let (encoded, _, _) = WINDOWS_1251.encode(source);

        let decoded = detect_and_decode(&encoded);
        assert_eq!(decoded.encoding, WINDOWS_1251);
        assert!(decoded.text.contains("Понедельник"));
        assert!(decoded.text.contains("Математика"));
    }

    #[test]
    fn test_read_file_bytes() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "Subject,Day\nMath,Monday").unwrap();

        let bytes = read_file_bytes(temp_file.path()).unwrap();
        assert_eq!(bytes.len(), 23);
        assert!(detect_and_decode(&bytes).text.contains("Math"));
    }

    #[test]
    fn test_read_file_bytes_missing() {
        let result = read_file_bytes(Path::new("does_not_exist.csv"));
        assert!(matches!(result, Err(PipelineError::FileNotFound(_))));
    }
}
