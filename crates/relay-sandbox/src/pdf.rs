//! Minimal single-page PDF writer.
//!
//! Produces a PDF 1.4 file with one US Letter page of Helvetica text: a title
//! line followed by body lines. Offsets in the cross-reference table are byte
//! positions in the output, so the file opens without repair.

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN: u32 = 72;
const TITLE_SIZE: u32 = 18;
const BODY_SIZE: u32 = 12;
const LEADING: u32 = 16;

/// A titled page of text lines.
#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    title: String,
    lines: Vec<String>,
}

impl PdfDocument {
    /// An empty document titled `title`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    /// Append a body line.
    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.lines.push(text.into());
        self
    }

    fn content_stream(&self) -> String {
        let top = PAGE_HEIGHT - MARGIN;
        let mut content = format!(
            "BT\n/F1 {TITLE_SIZE} Tf\n{MARGIN} {top} Td\n({}) Tj\nET\n",
            escape_text(&self.title)
        );

        if !self.lines.is_empty() {
            let body_top = top - 2 * LEADING;
            content.push_str(&format!(
                "BT\n/F1 {BODY_SIZE} Tf\n{LEADING} TL\n{MARGIN} {body_top} Td\n"
            ));
            for (i, line) in self.lines.iter().enumerate() {
                if i > 0 {
                    content.push_str("T*\n");
                }
                content.push_str(&format!("({}) Tj\n", escape_text(line)));
            }
            content.push_str("ET\n");
        }
        content
    }

    /// Serialize the document.
    pub fn render(&self) -> Vec<u8> {
        let content = self.content_stream();
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            ),
            format!(
                "<< /Length {} >>\nstream\n{content}endstream",
                content.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }

        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        out
    }
}

/// Escape a string for a PDF literal. Characters outside printable ASCII
/// become `?` since the font encoding is single-byte.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            ' '..='~' => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}
