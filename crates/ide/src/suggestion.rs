use lang_syntax::TextRange;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    Keyword,
    ResourceType,
    Property,
    Function,
    Symbol,
    Snippet,
    /// A literal value for a typed property: an enum member or a boolean.
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsertTextFormat {
    #[default]
    PlainText,
    /// Text with `$0`/`$1` tab stops.
    Snippet,
}

/// A half-open byte range `[start, end)` in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn clamp(self, len: u32) -> Self {
        let end = self.end.min(len);
        Self {
            start: self.start.min(end),
            end,
        }
    }
}

impl From<TextRange> for Span {
    fn from(range: TextRange) -> Self {
        Self {
            start: range.start().into(),
            end: range.end().into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Span,
    pub new_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub label: SmolStr,
    pub kind: SuggestionKind,
    pub insert_text: String,
    pub insert_text_format: InsertTextFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_range: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_edits: Vec<TextEdit>,
}

impl Suggestion {
    /// A plain-text suggestion that inserts its label.
    pub fn new(label: impl Into<SmolStr>, kind: SuggestionKind) -> Self {
        let label = label.into();
        Self {
            insert_text: label.to_string(),
            label,
            kind,
            insert_text_format: InsertTextFormat::PlainText,
            detail: None,
            replacement_range: None,
            documentation: None,
            additional_edits: Vec::new(),
        }
    }

    pub fn insert(mut self, text: impl Into<String>) -> Self {
        self.insert_text = text.into();
        self.insert_text_format = InsertTextFormat::PlainText;
        self
    }

    pub fn snippet(mut self, text: impl Into<String>) -> Self {
        self.insert_text = text.into();
        self.insert_text_format = InsertTextFormat::Snippet;
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn documentation(mut self, docs: Option<impl Into<String>>) -> Self {
        self.documentation = docs.map(Into::into);
        self
    }

    pub fn replacing(mut self, range: TextRange) -> Self {
        self.replacement_range = Some(range.into());
        self
    }

    pub fn with_edit(mut self, range: TextRange, new_text: impl Into<String>) -> Self {
        self.additional_edits.push(TextEdit {
            range: range.into(),
            new_text: new_text.into(),
        });
        self
    }

    pub fn is_snippet(&self) -> bool {
        self.insert_text_format == InsertTextFormat::Snippet
    }

    /// Line endings as `\n` and every range inside a document of `len`
    /// bytes.
    pub(crate) fn normalize(&mut self, len: u32) {
        normalize_newlines(&mut self.insert_text);
        if let Some(docs) = &mut self.documentation {
            normalize_newlines(docs);
        }
        if let Some(detail) = &mut self.detail {
            normalize_newlines(detail);
        }
        self.replacement_range = self.replacement_range.map(|r| r.clamp(len));
        for edit in &mut self.additional_edits {
            normalize_newlines(&mut edit.new_text);
            edit.range = edit.range.clamp(len);
        }
    }
}

fn normalize_newlines(text: &mut String) {
    if text.contains('\r') {
        *text = text.replace("\r\n", "\n").replace('\r', "\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lang_syntax::TextSize;

    #[test]
    fn serializes_camel_case_and_skips_empty_fields() {
        let s = Suggestion::new("concat", SuggestionKind::Function).snippet("concat($0)");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "label": "concat",
                "kind": "function",
                "insertText": "concat($0)",
                "insertTextFormat": "snippet",
            })
        );
    }

    #[test]
    fn serializes_ranges_and_edits() {
        let range = TextRange::new(TextSize::new(3), TextSize::new(5));
        let s = Suggestion::new("a-b", SuggestionKind::Property)
            .insert("['a-b']")
            .replacing(range)
            .with_edit(TextRange::new(TextSize::new(2), TextSize::new(3)), "");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["replacementRange"], serde_json::json!({"start": 3, "end": 5}));
        assert_eq!(
            json["additionalEdits"],
            serde_json::json!([{"range": {"start": 2, "end": 3}, "newText": ""}])
        );
    }

    #[test]
    fn normalize_line_endings_and_ranges() {
        let mut s = Suggestion::new("x", SuggestionKind::Snippet)
            .snippet("{\r\n\t$0\r\n}")
            .documentation(Some("a\r\nb"))
            .replacing(TextRange::new(TextSize::new(4), TextSize::new(40)));
        s.normalize(10);
        assert_eq!(s.insert_text, "{\n\t$0\n}");
        assert_eq!(s.documentation.as_deref(), Some("a\nb"));
        assert_eq!(s.replacement_range, Some(Span { start: 4, end: 10 }));
    }

    #[test]
    fn clamp_keeps_start_before_end() {
        assert_eq!(Span { start: 12, end: 15 }.clamp(10), Span { start: 10, end: 10 });
    }
}
