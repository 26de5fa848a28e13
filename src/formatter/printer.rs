use unicode_width::UnicodeWidthStr;

use super::FormatOptions;
use super::tree::{Element, Node};
use crate::markup::{Attribute, elements};

/// Render a validated node tree as canonical markup.
pub fn print(nodes: &[Node<'_>], options: &FormatOptions) -> String {
    let mut printer = Printer {
        lines: Vec::new(),
        options,
    };
    printer.block(nodes, 0);
    if printer.lines.is_empty() {
        return String::new();
    }
    let mut out = printer.lines.join("\n");
    out.push('\n');
    out
}

enum OpenTag {
    Single(String),
    /// Attributes one per line, used when the single-line tag is too wide.
    Broken(Vec<String>),
}

struct Printer<'o> {
    lines: Vec<String>,
    options: &'o FormatOptions,
}

impl Printer<'_> {
    fn indent(&self, depth: usize) -> String {
        " ".repeat(depth * self.options.indent_width)
    }

    fn available(&self, depth: usize) -> usize {
        self.options
            .max_line_width
            .saturating_sub(depth * self.options.indent_width)
    }

    fn push_line(&mut self, depth: usize, text: &str) {
        let line = format!("{}{text}", self.indent(depth));
        self.lines.push(line);
    }

    fn block(&mut self, nodes: &[Node<'_>], depth: usize) {
        let mut run: Vec<&Node<'_>> = Vec::new();
        for node in nodes {
            if is_inline(node) {
                run.push(node);
                continue;
            }
            self.fill(&inline_pieces(run.drain(..)), depth);
            self.block_node(node, depth);
        }
        self.fill(&inline_pieces(run), depth);
    }

    fn block_node(&mut self, node: &Node<'_>, depth: usize) {
        match node {
            Node::Text(_) => self.fill(&inline_pieces([node]), depth),
            Node::Comment(body) => self.push_line(depth, &format!("<!--{body}-->")),
            Node::Declaration(raw) => {
                let collapsed = raw.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
                self.push_line(depth, &collapsed);
            }
            Node::Element(element) => self.element(element, depth),
        }
    }

    /// Greedy fill: pieces are unbreakable, the single space between two
    /// pieces may become a line break.
    fn fill(&mut self, pieces: &[String], depth: usize) {
        let available = self.available(depth);
        let mut line = String::new();
        let mut width = 0;
        for piece in pieces {
            let piece_width = piece.width();
            if line.is_empty() {
                line.push_str(piece);
                width = piece_width;
            } else if width + 1 + piece_width <= available {
                line.push(' ');
                line.push_str(piece);
                width += 1 + piece_width;
            } else {
                self.push_line(depth, &line);
                line.clone_from(piece);
                width = piece_width;
            }
        }
        if !line.is_empty() {
            self.push_line(depth, &line);
        }
    }

    fn element(&mut self, element: &Element<'_>, depth: usize) {
        let open = self.open_tag(element, depth);
        let close = format!("</{}>", element.name);

        if element.is_void() {
            self.open_lines(&open, element, depth);
            return;
        }

        if elements::is_preformatted(element.name) {
            let body = element.body.unwrap_or_default();
            self.closed_on_last_line(&open, element, &format!("{body}{close}"), depth);
            return;
        }

        if elements::is_raw_text(element.name) {
            let body = dedent(element.body.unwrap_or_default());
            if body.is_empty() {
                self.closed_on_last_line(&open, element, &close, depth);
                return;
            }
            if let (OpenTag::Single(tag), [only]) = (&open, body.as_slice()) {
                let one_line = format!("{tag}{only}{close}");
                if one_line.width() <= self.available(depth) {
                    self.push_line(depth, &one_line);
                    return;
                }
            }
            self.open_lines(&open, element, depth);
            for line in body {
                if line.is_empty() {
                    self.lines.push(line);
                } else {
                    self.push_line(depth + 1, &line);
                }
            }
            self.push_line(depth, &close);
            return;
        }

        if element.children.iter().all(is_inline) {
            let pieces = inline_pieces(&element.children);
            if pieces.is_empty() {
                self.closed_on_last_line(&open, element, &close, depth);
                return;
            }
            if let OpenTag::Single(tag) = &open {
                let one_line = format!("{tag}{}{close}", pieces.join(" "));
                if one_line.width() <= self.available(depth) {
                    self.push_line(depth, &one_line);
                    return;
                }
            }
            self.open_lines(&open, element, depth);
            self.fill(&pieces, depth + 1);
            self.push_line(depth, &close);
            return;
        }

        self.open_lines(&open, element, depth);
        self.block(&element.children, depth + 1);
        self.push_line(depth, &close);
    }

    fn open_tag(&self, element: &Element<'_>, depth: usize) -> OpenTag {
        let single = inline_open_tag(element);
        if element.attrs.len() >= 2 && single.width() > self.available(depth) {
            OpenTag::Broken(element.attrs.iter().map(render_attribute).collect())
        } else {
            OpenTag::Single(single)
        }
    }

    fn open_lines(&mut self, open: &OpenTag, element: &Element<'_>, depth: usize) {
        self.closed_on_last_line(open, element, "", depth);
    }

    /// Emit the start tag with `tail` glued directly after its `>`.
    fn closed_on_last_line(
        &mut self,
        open: &OpenTag,
        element: &Element<'_>,
        tail: &str,
        depth: usize,
    ) {
        match open {
            OpenTag::Single(tag) => self.push_line(depth, &format!("{tag}{tail}")),
            OpenTag::Broken(attrs) => {
                self.push_line(depth, &format!("<{}", element.name));
                for attr in attrs {
                    self.push_line(depth + 1, attr);
                }
                self.push_line(depth, &format!(">{tail}"));
            }
        }
    }
}

fn is_inline(node: &Node<'_>) -> bool {
    match node {
        Node::Text(_) => true,
        Node::Element(element) => {
            elements::is_inline(element.name)
                && !elements::has_opaque_body(element.name)
                && element.children.iter().all(is_inline)
        }
        Node::Comment(_) | Node::Declaration(_) => false,
    }
}

fn inline_open_tag(element: &Element<'_>) -> String {
    if element.attrs.is_empty() {
        return format!("<{}>", element.name);
    }
    let attrs: Vec<String> = element.attrs.iter().map(render_attribute).collect();
    format!("<{} {}>", element.name, attrs.join(" "))
}

fn render_attribute(attr: &Attribute<'_>) -> String {
    match attr.value {
        None => attr.name.to_string(),
        Some(value) if !value.contains('"') => format!("{}=\"{value}\"", attr.name),
        Some(value) if !value.contains('\'') => format!("{}='{value}'", attr.name),
        Some(value) => format!("{}=\"{}\"", attr.name, value.replace('"', "&quot;")),
    }
}

/// Split inline content into unbreakable pieces.
///
/// Whitespace in the source is the only place a line may break; everything
/// glued together without whitespace (a word and an adjacent tag, say) stays
/// in one piece.
fn inline_pieces<'n, 'a: 'n>(nodes: impl IntoIterator<Item = &'n Node<'a>>) -> Vec<String> {
    let mut builder = PieceBuilder::default();
    for node in nodes {
        builder.node(node);
    }
    builder.finish()
}

#[derive(Default)]
struct PieceBuilder {
    pieces: Vec<String>,
    current: String,
}

impl PieceBuilder {
    fn node(&mut self, node: &Node<'_>) {
        match node {
            Node::Text(text) => self.text(text),
            Node::Element(element) => {
                self.current.push_str(&inline_open_tag(element));
                for child in &element.children {
                    self.node(child);
                }
                if !element.is_void() {
                    self.current.push_str("</");
                    self.current.push_str(element.name);
                    self.current.push('>');
                }
            }
            Node::Comment(body) => {
                self.current.push_str("<!--");
                self.current.push_str(body);
                self.current.push_str("-->");
            }
            Node::Declaration(raw) => self.current.push_str(raw),
        }
    }

    fn text(&mut self, text: &str) {
        let mut rest = text;
        while !rest.is_empty() {
            let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
            if trimmed.len() != rest.len() {
                self.break_here();
                rest = trimmed;
                continue;
            }
            let word_len = rest
                .find(|c: char| c.is_ascii_whitespace())
                .unwrap_or(rest.len());
            self.current.push_str(&rest[..word_len]);
            rest = &rest[word_len..];
        }
    }

    fn break_here(&mut self) {
        if !self.current.is_empty() {
            self.pieces.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.break_here();
        self.pieces
    }
}

/// Strip blank edges and the common leading indentation of a raw body.
fn dedent(body: &str) -> Vec<String> {
    let lines: Vec<&str> = body.lines().map(str::trim_end).collect();
    let Some(first) = lines.iter().position(|line| !line.is_empty()) else {
        return Vec::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .unwrap_or(first);
    let lines = &lines[first..=last];
    let common = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                line[common..].to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedent_strips_common_indent_and_blank_edges() {
        let body = "\n\n    let a = 1;\n      if (a) {}\n\n    done();\n  ";
        assert_eq!(
            dedent(body),
            vec!["let a = 1;", "  if (a) {}", "", "done();"]
        );
    }

    #[test]
    fn test_dedent_of_blank_body_is_empty() {
        assert!(dedent("  \n\t\n").is_empty());
    }

    #[test]
    fn test_render_attribute_quoting() {
        let bare = Attribute {
            name: "hidden",
            value: None,
        };
        let plain = Attribute {
            name: "id",
            value: Some("x"),
        };
        let has_double = Attribute {
            name: "title",
            value: Some("say \"hi\""),
        };
        let has_both = Attribute {
            name: "title",
            value: Some("it's \"x\""),
        };
        assert_eq!(render_attribute(&bare), "hidden");
        assert_eq!(render_attribute(&plain), "id=\"x\"");
        assert_eq!(render_attribute(&has_double), "title='say \"hi\"'");
        assert_eq!(render_attribute(&has_both), "title=\"it's &quot;x&quot;\"");
    }

    #[test]
    fn test_pieces_keep_glued_tags_together() {
        let nodes = vec![
            Node::Text("Hello "),
            Node::Element(Element {
                name: "b",
                attrs: Vec::new(),
                children: vec![Node::Text("world")],
                body: None,
            }),
            Node::Text("!  again"),
        ];
        assert_eq!(
            inline_pieces(&nodes),
            vec!["Hello", "<b>world</b>!", "again"]
        );
    }
}
