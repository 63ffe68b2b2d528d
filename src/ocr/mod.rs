//! OCR capability.
//!
//! `read_text` may fail per call; the orchestrator logs the failure and
//! drops that one observation without ending the cycle. Whether an
//! implementation caches results across frames is its own business - the
//! pipeline only sees observations for frames where it chose to run OCR.

use anyhow::Result;

use crate::frame::{BoundingBox, Frame};

/// Raw text read from one plate region.
#[derive(Clone, Debug, PartialEq)]
pub struct OcrReading {
    pub text: String,
    /// 0.0-1.0.
    pub confidence: f32,
}

/// External OCR capability.
pub trait OcrReader {
    /// Read the text inside `region` of `frame`.
    fn read_text(&mut self, frame: &Frame, region: &BoundingBox) -> Result<OcrReading>;
}

/// Stub reader returning a fixed plate text. For demo runs and tests.
pub struct StubOcrReader {
    text: String,
    confidence: f32,
}

impl StubOcrReader {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            confidence: 0.95,
        }
    }
}

impl OcrReader for StubOcrReader {
    fn read_text(&mut self, _frame: &Frame, _region: &BoundingBox) -> Result<OcrReading> {
        Ok(OcrReading {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    #[test]
    fn stub_reader_returns_configured_text() {
        let frame = Frame {
            data: vec![0; 12],
            width: 2,
            height: 2,
            captured_at: SystemTime::now(),
            source: "stub://test".into(),
        };
        let mut reader = StubOcrReader::new("AB-123");
        let reading = reader
            .read_text(&frame, &BoundingBox::new(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        assert_eq!(reading.text, "AB-123");
        assert!(reading.confidence > 0.9);
    }
}
