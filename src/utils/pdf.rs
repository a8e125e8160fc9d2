// Minimal PDF helpers shared by the HTTP adapter and the CLI.

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8] = b"%PDF";

/// Returns true if `head` starts with the PDF signature.
pub fn has_pdf_magic(head: &[u8]) -> bool {
    head.starts_with(PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic() {
        assert!(has_pdf_magic(b"%PDF-1.7\n..."));
        assert!(has_pdf_magic(b"%PDF"));
        assert!(!has_pdf_magic(b"%PD"));
        assert!(!has_pdf_magic(b"{\"pdf_base64\": \"\"}"));
        assert!(!has_pdf_magic(b" %PDF-1.4"));
        assert!(!has_pdf_magic(b""));
    }
}
