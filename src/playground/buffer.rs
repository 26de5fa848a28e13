/// The single document the playground edits.
///
/// `raw_text` is what the user typed; `rendered_text` is what the preview
/// shows. Every mutation sets both, so outside an operation they are always
/// equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentBuffer {
    raw_text: String,
    rendered_text: String,
    revision: u64,
}

impl DocumentBuffer {
    pub fn new(text: String) -> Self {
        Self {
            rendered_text: text.clone(),
            raw_text: text,
            revision: 0,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn rendered_text(&self) -> &str {
        &self.rendered_text
    }

    /// Bumped on every change, so views derived from the text know when to
    /// rebuild.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn replace(&mut self, text: String) {
        self.rendered_text.clone_from(&text);
        self.raw_text = text;
        self.revision += 1;
    }

    /// Replace the text with a formatted version. Returns whether anything
    /// changed; the revision only moves if it did.
    pub fn apply_formatted(&mut self, text: String) -> bool {
        if text == self.raw_text && text == self.rendered_text {
            return false;
        }
        self.replace(text);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_sets_both_texts_and_bumps_revision() {
        let mut buffer = DocumentBuffer::new("a".to_string());
        assert_eq!(buffer.revision(), 0);
        buffer.replace("b".to_string());
        assert_eq!(buffer.raw_text(), "b");
        assert_eq!(buffer.rendered_text(), "b");
        assert_eq!(buffer.revision(), 1);
    }

    #[test]
    fn test_apply_formatted_only_bumps_on_change() {
        let mut buffer = DocumentBuffer::new("<p>x</p>\n".to_string());
        assert!(!buffer.apply_formatted("<p>x</p>\n".to_string()));
        assert_eq!(buffer.revision(), 0);
        assert!(buffer.apply_formatted("<p>y</p>\n".to_string()));
        assert_eq!(buffer.revision(), 1);
    }
}
