//! Element classification tables.
//!
//! Names are compared case-insensitively; the tables hold lowercase names.

/// Elements that never have content or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose body is raw text that is re-indented but never parsed.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements whose body is kept byte-for-byte.
pub const PREFORMATTED_ELEMENTS: &[&str] = &["pre", "textarea"];

/// Phrasing elements that flow with the surrounding text.
pub const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "button", "cite", "code", "data", "del", "dfn", "em",
    "i", "img", "input", "ins", "kbd", "label", "mark", "q", "s", "samp", "small", "span",
    "strong", "sub", "sup", "time", "u", "var", "wbr",
];

fn contains(table: &[&str], name: &str) -> bool {
    table.iter().any(|t| t.eq_ignore_ascii_case(name))
}

pub fn is_void(name: &str) -> bool {
    contains(VOID_ELEMENTS, name)
}

pub fn is_raw_text(name: &str) -> bool {
    contains(RAW_TEXT_ELEMENTS, name)
}

pub fn is_preformatted(name: &str) -> bool {
    contains(PREFORMATTED_ELEMENTS, name)
}

/// Raw text and preformatted elements both swallow their body unparsed.
pub fn has_opaque_body(name: &str) -> bool {
    is_raw_text(name) || is_preformatted(name)
}

pub fn is_inline(name: &str) -> bool {
    contains(INLINE_ELEMENTS, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_ignores_case() {
        assert!(is_void("BR"));
        assert!(is_raw_text("Script"));
        assert!(is_preformatted("PRE"));
        assert!(is_inline("Strong"));
        assert!(!is_inline("div"));
    }

    #[test]
    fn test_opaque_body_covers_script_and_pre() {
        assert!(has_opaque_body("style"));
        assert!(has_opaque_body("textarea"));
        assert!(!has_opaque_body("p"));
    }
}
