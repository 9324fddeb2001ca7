//! Typst markup building.
//!
//! All user-supplied text goes through [`escape_markup`] or [`string_literal`]
//! before it reaches the document source, so patient data can never inject
//! Typst code.

/// Characters with a meaning in Typst markup mode.
const MARKUP_SPECIALS: &[char] = &[
    '\\', '#', '*', '_', '`', '$', '<', '>', '@', '[', ']', '~', '/', '=', '-', '+', '"', '\'',
];

/// Escape text for use in Typst markup mode.
///
/// Newlines become Typst line breaks.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '\r' => {}
            '\n' => out.push_str(" \\\n"),
            c if MARKUP_SPECIALS.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Quote text as a Typst string literal for use in code mode.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Incremental builder for a Typst document source.
#[derive(Debug, Clone, Default)]
pub struct TypstDocument {
    source: String,
}

impl TypstDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Page setup. Must come before any content.
    pub fn page(&mut self, paper: &str, margin_cm: f32) -> &mut Self {
        self.source.push_str(&format!(
            "#set page(paper: {}, margin: {}cm)\n",
            string_literal(paper),
            margin_cm
        ));
        self
    }

    /// Base text settings.
    pub fn text_style(&mut self, size_pt: f32) -> &mut Self {
        self.source
            .push_str(&format!("#set text(size: {}pt)\n", size_pt));
        self
    }

    /// Section heading (level 1 = `=`).
    pub fn heading(&mut self, level: u8, text: &str) -> &mut Self {
        let marker = "=".repeat(level.max(1) as usize);
        self.source
            .push_str(&format!("\n{} {}\n", marker, escape_markup(text)));
        self
    }

    /// Paragraph of escaped text.
    pub fn paragraph(&mut self, text: &str) -> &mut Self {
        self.source.push('\n');
        self.source.push_str(&escape_markup(text));
        self.source.push('\n');
        self
    }

    /// Bold label followed by a value on its own line.
    pub fn field(&mut self, label: &str, value: &str) -> &mut Self {
        self.source.push_str(&format!(
            "*{}:* {} \\\n",
            escape_markup(label),
            escape_markup(value)
        ));
        self
    }

    /// Image from an absolute path, centered.
    pub fn image(&mut self, path: &str, width_pt: u32) -> &mut Self {
        self.source.push_str(&format!(
            "#align(center, image({}, width: {}pt))\n",
            string_literal(path),
            width_pt
        ));
        self
    }

    /// Table with a bold header row.
    pub fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> &mut Self {
        if headers.is_empty() {
            return self;
        }

        self.source.push_str(&format!(
            "#table(\n  columns: {},\n  inset: 6pt,\n",
            headers.len()
        ));
        let header_cells: Vec<String> = headers
            .iter()
            .map(|h| format!("[*{}*]", escape_markup(h)))
            .collect();
        self.source
            .push_str(&format!("  {},\n", header_cells.join(", ")));

        for row in rows {
            // Pad short rows so the cell count stays a multiple of the column count
            let cells: Vec<String> = (0..headers.len())
                .map(|i| string_literal(row.get(i).map(String::as_str).unwrap_or("")))
                .collect();
            self.source.push_str(&format!("  {},\n", cells.join(", ")));
        }
        self.source.push_str(")\n");
        self
    }

    /// Bulleted list.
    pub fn bullet_list<S: AsRef<str>>(&mut self, items: &[S]) -> &mut Self {
        self.source.push('\n');
        for item in items {
            self.source
                .push_str(&format!("- {}\n", escape_markup(item.as_ref())));
        }
        self
    }

    /// Vertical spacing.
    pub fn spacing(&mut self, em: f32) -> &mut Self {
        self.source.push_str(&format!("#v({}em)\n", em));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Finish building and return the source.
    pub fn finish(self) -> String {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(escape_markup("plain text"), "plain text");
        assert_eq!(escape_markup("#let x = 1"), "\\#let x \\= 1");
        assert_eq!(escape_markup("a*b_c"), "a\\*b\\_c");
        assert_eq!(escape_markup("line1\nline2"), "line1 \\\nline2");
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal("abc"), "\"abc\"");
        assert_eq!(string_literal("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(string_literal("C:\\logo"), "\"C:\\\\logo\"");
        assert_eq!(string_literal("a\nb"), "\"a\\nb\"");
    }

    #[test]
    fn test_document_builder() {
        let mut doc = TypstDocument::new();
        doc.page("a4", 1.5)
            .heading(1, "Discharge Summary")
            .field("Name", "Jane #1")
            .table(&["Medicine", "Dose"], &[vec!["Paracetamol".into(), "500 mg".into()]]);
        let source = doc.finish();

        assert!(source.starts_with("#set page(paper: \"a4\", margin: 1.5cm)"));
        assert!(source.contains("= Discharge Summary"));
        assert!(source.contains("*Name:* Jane \\#1"));
        assert!(source.contains("columns: 2"));
        assert!(source.contains("\"Paracetamol\", \"500 mg\""));
    }

    #[test]
    fn test_table_pads_short_rows() {
        let mut doc = TypstDocument::new();
        doc.table(&["A", "B", "C"], &[vec!["only".into()]]);
        let source = doc.finish();
        assert!(source.contains("\"only\", \"\", \"\""));
    }

    #[test]
    fn test_empty_table_emits_nothing() {
        let mut doc = TypstDocument::new();
        doc.table(&[], &[]);
        assert!(doc.is_empty());
    }
}
