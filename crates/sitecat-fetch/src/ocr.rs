//! OCR seam for rendered screenshots.

/// Best-effort text extraction from an image payload. Implementations never
/// fail; unreadable input yields an empty string.
pub trait TextFromImage: Send + Sync {
    fn extract_text(&self, image: &[u8]) -> String;
}

/// Default implementation for fetchers that produce no screenshots.
///
/// Keeps the `ocr`/`both` extraction methods wired end to end; a real OCR
/// engine slots in behind the same trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOcr;

impl TextFromImage for NoopOcr {
    fn extract_text(&self, _image: &[u8]) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_ocr_yields_empty_text() {
        assert_eq!(NoopOcr.extract_text(&[1, 2, 3]), "");
    }
}
