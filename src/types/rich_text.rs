use super::Color;
use serde::{Deserialize, Serialize};

/// Formatting attributes of a text run.
///
/// `color` is a foreground palette entry and `background` a highlight
/// palette entry; `None` means the note did not color the run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Option<Color>,
    pub background: Option<Color>,
    pub link: Option<String>,
}

impl Annotations {
    pub fn is_plain(&self) -> bool {
        *self == Annotations::default()
    }
}

/// A run of text sharing one set of annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextItem {
    pub content: String,
    pub annotations: Annotations,
}

impl RichTextItem {
    /// Create a plain text item — the most common rich text variant.
    pub fn plain_text(text: &str) -> Self {
        Self {
            content: text.to_string(),
            annotations: Annotations::default(),
        }
    }

    pub fn styled(text: impl Into<String>, annotations: Annotations) -> Self {
        Self {
            content: text.into(),
            annotations,
        }
    }

    /// The run used to join condensed lines.
    pub fn line_break() -> Self {
        Self::plain_text("\n")
    }
}

/// Concatenates the text of all runs, dropping formatting.
pub fn plain_text_of(runs: &[RichTextItem]) -> String {
    runs.iter().map(|r| r.content.as_str()).collect()
}

/// Appends a run, merging it into the previous one when formatting matches.
pub fn push_run(runs: &mut Vec<RichTextItem>, item: RichTextItem) {
    if item.content.is_empty() {
        return;
    }
    if let Some(last) = runs.last_mut() {
        if last.annotations == item.annotations {
            last.content.push_str(&item.content);
            return;
        }
    }
    runs.push(item);
}
