use crate::error::{ParseError, Position};

use super::elements;

/// A single `name` or `name=value` pair inside a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    /// `None` for bare attributes such as `disabled`.
    pub value: Option<&'a str>,
}

/// A lexical unit of markup, borrowing from the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    StartTag {
        name: &'a str,
        attrs: Vec<Attribute<'a>>,
        self_closing: bool,
        offset: usize,
    },
    EndTag {
        name: &'a str,
        offset: usize,
    },
    /// Body of a raw text or preformatted element; always directly follows
    /// its start tag.
    RawText(&'a str),
    Comment(&'a str),
    /// `<!DOCTYPE ...>` or `<?...>`, verbatim including the brackets.
    Declaration(&'a str),
}

/// Tokenize markup, failing on the first malformed construct.
///
/// # Errors
///
/// Returns a [`ParseError`] for unterminated tags, comments or attribute
/// values, and for raw text elements that are never closed.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, ParseError> {
    Lexer::new(src, true).run()
}

/// Tokenize markup without ever failing.
///
/// Malformed constructs degrade to text: a `<` that does not start a
/// well-formed tag is kept as a literal character, and an unclosed raw text
/// element swallows the rest of the input.
pub fn tokenize_lenient(src: &str) -> Vec<Token<'_>> {
    Lexer::new(src, false)
        .run()
        .unwrap_or_else(|_| vec![Token::Text(src)])
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    text_start: usize,
    strict: bool,
    tokens: Vec<Token<'a>>,
}

type Scanned<'a> = Result<Option<(Token<'a>, usize)>, ParseError>;

impl<'a> Lexer<'a> {
    fn new(src: &'a str, strict: bool) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            text_start: 0,
            strict,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, ParseError> {
        while let Some(rel) = self.bytes[self.pos..].iter().position(|&b| b == b'<') {
            let start = self.pos + rel;
            match self.markup_at(start) {
                Ok(Some((token, end))) => {
                    self.flush_text(start);
                    self.pos = end;
                    self.text_start = end;
                    let opaque = match &token {
                        Token::StartTag {
                            name,
                            self_closing: false,
                            offset,
                            ..
                        } if elements::has_opaque_body(name) => Some((*name, *offset)),
                        _ => None,
                    };
                    self.tokens.push(token);
                    if let Some((name, offset)) = opaque {
                        self.opaque_body(name, offset)?;
                    }
                }
                Ok(None) => self.pos = start + 1,
                Err(err) if self.strict => return Err(err),
                Err(_) => self.pos = start + 1,
            }
        }
        self.flush_text(self.bytes.len());
        Ok(self.tokens)
    }

    fn flush_text(&mut self, upto: usize) {
        if upto > self.text_start {
            self.tokens.push(Token::Text(&self.src[self.text_start..upto]));
        }
        self.text_start = upto;
    }

    fn position(&self, offset: usize) -> Position {
        Position::at_offset(self.src, offset)
    }

    /// Consume the body of `<script>`, `<pre>` and friends up to the
    /// matching end tag, which is left for the main loop.
    fn opaque_body(&mut self, name: &'a str, offset: usize) -> Result<(), ParseError> {
        if let Some(close) = self.find_closing(name, self.pos) {
            self.tokens.push(Token::RawText(&self.src[self.pos..close]));
            self.pos = close;
            self.text_start = close;
            return Ok(());
        }
        if self.strict {
            return Err(ParseError::UnclosedElement {
                name: name.to_string(),
                at: self.position(offset),
            });
        }
        self.tokens.push(Token::RawText(&self.src[self.pos..]));
        self.pos = self.bytes.len();
        self.text_start = self.pos;
        Ok(())
    }

    fn find_closing(&self, name: &str, from: usize) -> Option<usize> {
        let needle = name.as_bytes();
        let mut search = from;
        while let Some(rel) = self.bytes[search..].windows(2).position(|w| w == b"</") {
            let at = search + rel;
            let name_start = at + 2;
            let name_end = name_start + needle.len();
            if self
                .bytes
                .get(name_start..name_end)
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(needle))
                && self
                    .bytes
                    .get(name_end)
                    .is_none_or(|&b| b.is_ascii_whitespace() || b == b'>' || b == b'/')
            {
                return Some(at);
            }
            search = at + 2;
        }
        None
    }

    fn markup_at(&self, start: usize) -> Scanned<'a> {
        let rest = &self.bytes[start..];
        if rest.starts_with(b"<!--") {
            return self.comment(start);
        }
        match rest.get(1) {
            Some(b'!' | b'?') => self.declaration(start),
            Some(b'/') if rest.get(2).is_some_and(u8::is_ascii_alphabetic) => self.end_tag(start),
            Some(b) if b.is_ascii_alphabetic() => self.start_tag(start),
            _ => Ok(None),
        }
    }

    fn comment(&self, start: usize) -> Scanned<'a> {
        let body_start = start + 4;
        let Some(rel) = self.bytes[body_start..]
            .windows(3)
            .position(|w| w == b"-->")
        else {
            return Err(ParseError::UnterminatedComment {
                at: self.position(start),
            });
        };
        let body_end = body_start + rel;
        Ok(Some((
            Token::Comment(&self.src[body_start..body_end]),
            body_end + 3,
        )))
    }

    fn declaration(&self, start: usize) -> Scanned<'a> {
        let Some(rel) = self.bytes[start..].iter().position(|&b| b == b'>') else {
            return Err(ParseError::UnterminatedTag {
                at: self.position(start),
            });
        };
        let end = start + rel + 1;
        Ok(Some((Token::Declaration(&self.src[start..end]), end)))
    }

    fn end_tag(&self, start: usize) -> Scanned<'a> {
        let name_start = start + 2;
        let name_end = self.scan_name(name_start);
        for p in name_end..self.bytes.len() {
            match self.bytes[p] {
                b'>' => {
                    return Ok(Some((
                        Token::EndTag {
                            name: &self.src[name_start..name_end],
                            offset: start,
                        },
                        p + 1,
                    )));
                }
                b'<' => break,
                _ => {}
            }
        }
        Err(ParseError::UnterminatedTag {
            at: self.position(start),
        })
    }

    fn start_tag(&self, start: usize) -> Scanned<'a> {
        let name_start = start + 1;
        let mut p = self.scan_name(name_start);
        let name = &self.src[name_start..p];
        let unterminated = || ParseError::UnterminatedTag {
            at: self.position(start),
        };
        let mut attrs = Vec::new();

        loop {
            p = self.skip_whitespace(p);
            match self.bytes.get(p) {
                None | Some(b'<') => return Err(unterminated()),
                Some(b'>') => {
                    let token = Token::StartTag {
                        name,
                        attrs,
                        self_closing: false,
                        offset: start,
                    };
                    return Ok(Some((token, p + 1)));
                }
                Some(b'/') => {
                    if self.bytes.get(p + 1) == Some(&b'>') {
                        let token = Token::StartTag {
                            name,
                            attrs,
                            self_closing: true,
                            offset: start,
                        };
                        return Ok(Some((token, p + 2)));
                    }
                    p += 1;
                }
                Some(_) => {
                    let attr_start = p;
                    p = self.scan_attr_name(p);
                    if p == attr_start {
                        return Err(unterminated());
                    }
                    let attr_name = &self.src[attr_start..p];
                    let after_name = self.skip_whitespace(p);
                    if self.bytes.get(after_name) != Some(&b'=') {
                        attrs.push(Attribute {
                            name: attr_name,
                            value: None,
                        });
                        continue;
                    }
                    p = self.skip_whitespace(after_name + 1);
                    let value = match self.bytes.get(p) {
                        Some(&quote @ (b'"' | b'\'')) => {
                            let value_start = p + 1;
                            let Some(rel) =
                                self.bytes[value_start..].iter().position(|&b| b == quote)
                            else {
                                return Err(ParseError::UnterminatedAttribute {
                                    tag: name.to_string(),
                                    at: self.position(attr_start),
                                });
                            };
                            p = value_start + rel + 1;
                            &self.src[value_start..value_start + rel]
                        }
                        None | Some(b'>') => "",
                        Some(_) => {
                            let value_start = p;
                            while p < self.bytes.len()
                                && !self.bytes[p].is_ascii_whitespace()
                                && self.bytes[p] != b'>'
                            {
                                p += 1;
                            }
                            &self.src[value_start..p]
                        }
                    };
                    attrs.push(Attribute {
                        name: attr_name,
                        value: Some(value),
                    });
                }
            }
        }
    }

    fn scan_name(&self, from: usize) -> usize {
        let mut p = from;
        while p < self.bytes.len()
            && !self.bytes[p].is_ascii_whitespace()
            && !matches!(self.bytes[p], b'/' | b'>' | b'<')
        {
            p += 1;
        }
        p
    }

    fn scan_attr_name(&self, from: usize) -> usize {
        let mut p = from;
        while p < self.bytes.len()
            && !self.bytes[p].is_ascii_whitespace()
            && !matches!(self.bytes[p], b'/' | b'>' | b'<' | b'=' | b'"' | b'\'')
        {
            p += 1;
        }
        p
    }

    fn skip_whitespace(&self, from: usize) -> usize {
        let mut p = from;
        while p < self.bytes.len() && self.bytes[p].is_ascii_whitespace() {
            p += 1;
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple_element() {
        let tokens = tokenize("<div class=\"a\">hi</div>").unwrap();
        assert_eq!(tokens.len(), 3);
        match &tokens[0] {
            Token::StartTag {
                name,
                attrs,
                self_closing,
                ..
            } => {
                assert_eq!(*name, "div");
                assert!(!self_closing);
                assert_eq!(
                    attrs,
                    &vec![Attribute {
                        name: "class",
                        value: Some("a")
                    }]
                );
            }
            other => panic!("expected start tag, got {other:?}"),
        }
        assert_eq!(tokens[1], Token::Text("hi"));
        assert!(matches!(tokens[2], Token::EndTag { name: "div", .. }));
    }

    #[test]
    fn test_attribute_forms() {
        let tokens = tokenize("<input disabled value=x data-a='1' b = \"2\">").unwrap();
        let Token::StartTag { attrs, .. } = &tokens[0] else {
            panic!("expected start tag");
        };
        let pairs: Vec<_> = attrs.iter().map(|a| (a.name, a.value)).collect();
        assert_eq!(
            pairs,
            vec![
                ("disabled", None),
                ("value", Some("x")),
                ("data-a", Some("1")),
                ("b", Some("2")),
            ]
        );
    }

    #[test]
    fn test_self_closing_tag() {
        let tokens = tokenize("<br/>").unwrap();
        assert!(matches!(
            tokens[0],
            Token::StartTag {
                self_closing: true,
                ..
            }
        ));
    }

    #[test]
    fn test_literal_less_than_is_text() {
        let tokens = tokenize("a < b and 1<2").unwrap();
        assert_eq!(tokens, vec![Token::Text("a < b and 1<2")]);
    }

    #[test]
    fn test_script_body_is_raw() {
        let tokens = tokenize("<script>if (a < b) { x('</p>') }</script>").unwrap();
        assert_eq!(tokens[1], Token::RawText("if (a < b) { x('</p>') }"));
        assert!(matches!(tokens[2], Token::EndTag { name: "script", .. }));
    }

    #[test]
    fn test_raw_end_tag_match_is_case_insensitive() {
        let tokens = tokenize("<style>p{}</STYLE>").unwrap();
        assert_eq!(tokens[1], Token::RawText("p{}"));
    }

    #[test]
    fn test_comment_and_declaration() {
        let tokens = tokenize("<!DOCTYPE html><!-- note -->").unwrap();
        assert_eq!(tokens[0], Token::Declaration("<!DOCTYPE html>"));
        assert_eq!(tokens[1], Token::Comment(" note "));
    }

    #[test]
    fn test_unterminated_tag_is_error_with_position() {
        let err = tokenize("ok\n  <div class=\"a\"").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedAttribute { .. }));

        let err = tokenize("ok\n  <div").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnterminatedTag {
                at: Position::new(2, 3)
            }
        );
    }

    #[test]
    fn test_unterminated_comment_is_error() {
        let err = tokenize("<!-- never").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedComment { .. }));
    }

    #[test]
    fn test_unclosed_script_is_error() {
        let err = tokenize("<script>let a = 1;").unwrap_err();
        assert!(matches!(err, ParseError::UnclosedElement { ref name, .. } if name == "script"));
    }

    #[test]
    fn test_lenient_keeps_broken_tag_as_text() {
        let tokens = tokenize_lenient("x <div y");
        assert_eq!(tokens, vec![Token::Text("x <div y")]);
    }

    #[test]
    fn test_lenient_unclosed_script_swallows_rest() {
        let tokens = tokenize_lenient("<script>alert(1)");
        assert_eq!(tokens[1], Token::RawText("alert(1)"));
    }

    #[test]
    fn test_tag_missing_close_bracket_before_next_tag() {
        let err = tokenize("<div <p>").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedTag { .. }));
    }
}
