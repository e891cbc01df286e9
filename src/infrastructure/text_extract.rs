//! 上传文件 → 纯文本
//!
//! 提取失败不返回错误，而是返回一段以 "Error" 开头的说明文字，
//! 由调用方当作大纲正文继续处理。

use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// 按扩展名判断，只接受 .pdf 和 .txt
    pub fn from_filename(filename: &str) -> Result<Self, StoreError> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            Ok(DocumentKind::Pdf)
        } else if lower.ends_with(".txt") {
            Ok(DocumentKind::PlainText)
        } else {
            Err(StoreError::UnsupportedFile {
                filename: filename.to_string(),
            })
        }
    }
}

pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> String {
    match kind {
        DocumentKind::Pdf => extract_pdf(bytes),
        DocumentKind::PlainText => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(e) => {
                warn!("文本解码失败: {}", e);
                format!("Error decoding text: {}", e)
            }
        },
    }
}

fn extract_pdf(bytes: &[u8]) -> String {
    // pdf-extract 在部分损坏的文件上会直接 panic
    let extracted = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));
    match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("PDF 提取失败: {}", e);
            format!("Error extracting PDF: {}", e)
        }
        Err(_) => {
            warn!("PDF 提取时发生 panic");
            "Error extracting PDF: malformed document".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_filename() {
        assert_eq!(DocumentKind::from_filename("notes.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("a.b.txt").unwrap(), DocumentKind::PlainText);
        let err = DocumentKind::from_filename("slides.pptx").unwrap_err();
        assert_eq!(err.to_string(), "Only PDF and TXT files are supported: slides.pptx");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = extract_text("Unit 1: Algebra\nUnit 2: Geometry".as_bytes(), DocumentKind::PlainText);
        assert_eq!(text, "Unit 1: Algebra\nUnit 2: Geometry");
    }

    #[test]
    fn test_invalid_utf8_is_soft_failure() {
        let text = extract_text(&[0xff, 0xfe, 0x41], DocumentKind::PlainText);
        assert!(text.starts_with("Error decoding text:"));
    }

    #[test]
    fn test_garbage_pdf_is_soft_failure() {
        let text = extract_text(b"definitely not a pdf", DocumentKind::Pdf);
        assert!(text.starts_with("Error extracting PDF:"));
    }
}
