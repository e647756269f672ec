use serde::Serialize;

/// Longest label shown in the list before it is cut with an ellipsis.
pub const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    Leading,
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Ligature joining and bidi reordering are needed when rendering. Never applied to stored or
    /// copied text.
    pub needs_reshaping: bool,
    pub alignment: Alignment,
}

pub fn is_arabic_script(ch: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&ch)
}

pub fn classify(text: &str) -> Classification {
    if text.chars().any(is_arabic_script) {
        Classification {
            needs_reshaping: true,
            alignment: Alignment::Trailing,
        }
    } else {
        Classification {
            needs_reshaping: false,
            alignment: Alignment::Leading,
        }
    }
}

pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_text_is_leading() {
        let result = classify("fn main() {}");
        assert_eq!(result.alignment, Alignment::Leading);
        assert!(!result.needs_reshaping);
    }

    #[test]
    fn arabic_and_farsi_are_trailing() {
        for text in ["مرحبا", "پیام", "order #42 تم"] {
            let result = classify(text);
            assert_eq!(result.alignment, Alignment::Trailing, "{text}");
            assert!(result.needs_reshaping, "{text}");
        }
    }

    #[test]
    fn hebrew_is_outside_the_detected_block() {
        assert_eq!(classify("שלום").alignment, Alignment::Leading);
    }

    #[test]
    fn empty_text_is_leading() {
        assert_eq!(classify("").alignment, Alignment::Leading);
    }

    #[test]
    fn preview_cuts_on_char_boundaries() {
        assert_eq!(preview("short", PREVIEW_CHARS), "short");
        assert_eq!(preview(&"x".repeat(PREVIEW_CHARS), PREVIEW_CHARS).len(), PREVIEW_CHARS);

        let long = "س".repeat(60);
        let cut = preview(&long, PREVIEW_CHARS);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 3);
    }
}
