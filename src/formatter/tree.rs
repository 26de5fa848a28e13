use crate::error::{ParseError, Position};
use crate::markup::{Attribute, Token, elements};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    Element(Element<'a>),
    Text(&'a str),
    Comment(&'a str),
    Declaration(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    pub name: &'a str,
    pub attrs: Vec<Attribute<'a>>,
    pub children: Vec<Node<'a>>,
    /// Body of a raw text or preformatted element.
    pub body: Option<&'a str>,
}

impl<'a> Element<'a> {
    const fn new(name: &'a str, attrs: Vec<Attribute<'a>>) -> Self {
        Self {
            name,
            attrs,
            children: Vec::new(),
            body: None,
        }
    }

    pub fn is_void(&self) -> bool {
        elements::is_void(self.name)
    }
}

/// Build a node tree from strict tokens, validating that every element is
/// closed by a matching end tag.
pub fn build<'a>(src: &'a str, tokens: Vec<Token<'a>>) -> Result<Vec<Node<'a>>, ParseError> {
    let mut root: Vec<Node<'a>> = Vec::new();
    let mut open: Vec<(Element<'a>, usize)> = Vec::new();
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        let node = match token {
            Token::Text(text) => Node::Text(text),
            Token::Comment(text) => Node::Comment(text),
            Token::Declaration(text) => Node::Declaration(text),
            // Bodies are consumed together with their start tag below.
            Token::RawText(_) => continue,
            Token::StartTag {
                name,
                attrs,
                self_closing,
                offset,
            } => {
                let mut element = Element::new(name, attrs);
                if self_closing || element.is_void() {
                    Node::Element(element)
                } else if elements::has_opaque_body(name) {
                    if let Some(Token::RawText(body)) = tokens.peek() {
                        element.body = Some(*body);
                        tokens.next();
                    }
                    match tokens.next() {
                        Some(Token::EndTag { .. }) => Node::Element(element),
                        _ => {
                            return Err(ParseError::UnclosedElement {
                                name: name.to_string(),
                                at: Position::at_offset(src, offset),
                            });
                        }
                    }
                } else {
                    open.push((element, offset));
                    continue;
                }
            }
            Token::EndTag { name, offset } => {
                let at = Position::at_offset(src, offset);
                let Some((top, _)) = open.last() else {
                    return Err(ParseError::UnexpectedClosingTag {
                        name: name.to_string(),
                        at,
                    });
                };
                if !top.name.eq_ignore_ascii_case(name) {
                    let deeper = open
                        .iter()
                        .any(|(element, _)| element.name.eq_ignore_ascii_case(name));
                    if deeper {
                        return Err(ParseError::MismatchedClosingTag {
                            expected: top.name.to_string(),
                            found: name.to_string(),
                            at,
                        });
                    }
                    return Err(ParseError::UnexpectedClosingTag {
                        name: name.to_string(),
                        at,
                    });
                }
                let Some((element, _)) = open.pop() else {
                    continue;
                };
                Node::Element(element)
            }
        };

        match open.last_mut() {
            Some((parent, _)) => parent.children.push(node),
            None => root.push(node),
        }
    }

    if let Some((element, offset)) = open.pop() {
        return Err(ParseError::UnclosedElement {
            name: element.name.to_string(),
            at: Position::at_offset(src, offset),
        });
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::tokenize;

    fn parse(src: &str) -> Result<Vec<Node<'_>>, ParseError> {
        build(src, tokenize(src)?)
    }

    #[test]
    fn test_nested_elements() {
        let nodes = parse("<ul><li>a</li><li>b</li></ul>").unwrap();
        assert_eq!(nodes.len(), 1);
        let Node::Element(ul) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(ul.name, "ul");
        assert_eq!(ul.children.len(), 2);
    }

    #[test]
    fn test_void_elements_take_no_children() {
        let nodes = parse("<p>a<br>b</p>").unwrap();
        let Node::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(p.children.len(), 3);
    }

    #[test]
    fn test_closing_tags_match_case_insensitively() {
        assert!(parse("<DIV>x</div>").is_ok());
    }

    #[test]
    fn test_unclosed_element_reports_innermost() {
        let err = parse("<div>\n<p>hi").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnclosedElement {
                name: "p".to_string(),
                at: Position::new(2, 1),
            }
        );
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = parse("<div><span>x</div>").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MismatchedClosingTag { ref expected, ref found, .. }
                if expected == "span" && found == "div"
        ));
    }

    #[test]
    fn test_stray_closing_tag() {
        let err = parse("text</p>").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClosingTag { .. }));
        let err = parse("<p>a</br></p>").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClosingTag { .. }));
    }

    #[test]
    fn test_script_body_is_attached() {
        let nodes = parse("<script>let a = 1;</script>").unwrap();
        let Node::Element(script) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(script.body, Some("let a = 1;"));
    }
}
