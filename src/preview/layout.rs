use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::text::{decode_entities, sanitize};
use super::types::{InlineSpan, InlineStyle, LineType, PreviewDocument, RenderedLine};
use crate::markup::{Attribute, Token, elements, tokenize_lenient};

const TAB_WIDTH: usize = 4;

/// Elements whose content is never shown.
const HIDDEN_ELEMENTS: &[&str] = &["head", "noscript", "script", "style", "template"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "caption",
    "dd",
    "details",
    "dialog",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "html",
    "legend",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "section",
    "summary",
    "table",
    "tbody",
    "tfoot",
    "thead",
    "tr",
    "ul",
];

/// Blocks separated from their neighbours by a blank line.
const SPACED_ELEMENTS: &[&str] = &[
    "blockquote",
    "dl",
    "figure",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "p",
    "table",
];

fn is_one_of(table: &[&str], name: &str) -> bool {
    table.contains(&name)
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn attr<'a>(attrs: &[Attribute<'a>], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(name))
        .and_then(|a| a.value)
}

fn clean(text: &str) -> String {
    sanitize(&decode_entities(text), TAB_WIDTH)
}

/// Clean text that must stay on one line, such as attribute values.
fn clean_inline(text: &str) -> String {
    clean(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// What closing an element has to undo.
#[derive(Debug)]
enum Kind {
    Block,
    Inline,
    Hidden,
    Title,
    Link(Option<String>),
    Button,
    List { ordered: bool, next: u64 },
    ListItem { bullet_width: usize },
    Row { cells: usize },
    Quote,
}

#[derive(Debug)]
struct Open {
    name: String,
    kind: Kind,
}

/// A run of non-whitespace text, possibly in several styles.
#[derive(Debug, Default)]
struct Word {
    space_before: bool,
    spans: Vec<InlineSpan>,
}

impl Word {
    fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text().width()).sum()
    }
}

pub struct Layout {
    width: usize,
    title: Option<String>,
    lines: Vec<RenderedLine>,
    stack: Vec<Open>,
    words: Vec<Word>,
    pending_space: bool,
    bullet: Option<String>,
}

impl Layout {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            title: None,
            lines: Vec::new(),
            stack: Vec::new(),
            words: Vec::new(),
            pending_space: false,
            bullet: None,
        }
    }

    pub fn render(mut self, markup: &str) -> PreviewDocument {
        let mut tokens = tokenize_lenient(markup).into_iter().peekable();
        while let Some(token) = tokens.next() {
            match token {
                Token::Text(text) => self.text(text),
                Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                    ..
                } => {
                    let name = name.to_ascii_lowercase();
                    let body = if elements::has_opaque_body(&name) && !self_closing {
                        match tokens.peek() {
                            Some(Token::RawText(body)) => {
                                let body = *body;
                                tokens.next();
                                Some(body)
                            }
                            _ => None,
                        }
                    } else {
                        None
                    };
                    self.start(&name, &attrs, self_closing, body);
                }
                Token::EndTag { name, .. } => self.end(&name.to_ascii_lowercase()),
                Token::RawText(_) | Token::Comment(_) | Token::Declaration(_) => {}
            }
        }
        while let Some(open) = self.stack.pop() {
            self.close(open);
        }
        self.flush();
        while self
            .lines
            .last()
            .is_some_and(|line| *line.line_type() == LineType::Empty)
        {
            self.lines.pop();
        }
        let title = self
            .title
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty());
        PreviewDocument::new(title, self.lines)
    }

    fn hidden(&self) -> bool {
        self.stack.iter().any(|o| matches!(o.kind, Kind::Hidden))
    }

    fn in_title(&self) -> bool {
        self.stack.iter().any(|o| matches!(o.kind, Kind::Title))
    }

    fn quote_depth(&self) -> usize {
        self.stack
            .iter()
            .filter(|o| matches!(o.kind, Kind::Quote))
            .count()
    }

    fn list_depth(&self) -> usize {
        self.stack
            .iter()
            .filter(|o| matches!(o.kind, Kind::List { .. }))
            .count()
    }

    fn inline_style(&self) -> InlineStyle {
        let mut style = InlineStyle::default();
        for open in &self.stack {
            match open.name.as_str() {
                "b" | "strong" | "th" => style.strong = true,
                "i" | "em" | "cite" | "dfn" | "var" => style.emphasis = true,
                "u" | "ins" => style.underline = true,
                "s" | "del" | "strike" => style.strikethrough = true,
                "code" | "kbd" | "samp" | "tt" => style.code = true,
                "mark" => style.mark = true,
                "a" => style.link = true,
                _ => {}
            }
        }
        style
    }

    fn line_type(&self) -> LineType {
        for open in self.stack.iter().rev() {
            if let Some(level) = heading_level(&open.name) {
                return LineType::Heading(level);
            }
            match open.kind {
                Kind::ListItem { .. } => return LineType::ListItem(self.list_depth()),
                Kind::Row { .. } => return LineType::Table,
                Kind::Quote => return LineType::BlockQuote,
                _ => {}
            }
        }
        LineType::Paragraph
    }

    /// Prefix for lines that do not start a list item.
    fn indent(&self) -> String {
        let mut prefix = "│ ".repeat(self.quote_depth());
        let depth = self.list_depth();
        if depth > 0 {
            prefix.push_str(&"  ".repeat(depth - 1));
            let bullet_width = self
                .stack
                .iter()
                .rev()
                .find_map(|o| match o.kind {
                    Kind::ListItem { bullet_width } => Some(bullet_width),
                    _ => None,
                })
                .unwrap_or(0);
            prefix.push_str(&" ".repeat(bullet_width));
        }
        prefix
    }

    fn first_prefix(&mut self) -> String {
        match self.bullet.take() {
            Some(bullet) => {
                let mut prefix = "│ ".repeat(self.quote_depth());
                prefix.push_str(&"  ".repeat(self.list_depth().saturating_sub(1)));
                prefix.push_str(&bullet);
                prefix
            }
            None => self.indent(),
        }
    }

    fn blank_line(&mut self) {
        if self
            .lines
            .last()
            .is_some_and(|line| *line.line_type() != LineType::Empty)
        {
            self.lines
                .push(RenderedLine::new(String::new(), LineType::Empty));
        }
    }

    fn push_word_text(&mut self, text: &str, style: InlineStyle) {
        if self.hidden() {
            return;
        }
        let space_before = std::mem::take(&mut self.pending_space);
        let continue_word = !space_before && !self.words.is_empty();
        if !continue_word {
            self.words.push(Word {
                space_before,
                spans: Vec::new(),
            });
        }
        if let Some(word) = self.words.last_mut() {
            push_span(&mut word.spans, text, style);
        }
    }

    /// Add a standalone placeholder such as `[image: alt]`.
    fn placeholder(&mut self, label: &str) {
        let style = InlineStyle {
            placeholder: true,
            ..self.inline_style()
        };
        self.pending_space = !self.words.is_empty() || self.pending_space;
        self.push_word_text(&clean_inline(label), style);
        self.pending_space = true;
    }

    fn text(&mut self, raw: &str) {
        if self.in_title() {
            let title = self.title.get_or_insert_with(String::new);
            title.push_str(&clean(raw));
            return;
        }
        if self.hidden() {
            return;
        }
        let text = clean(raw);
        let style = self.inline_style();
        let mut rest = text.as_str();
        while !rest.is_empty() {
            let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
            if trimmed.len() != rest.len() {
                if !self.words.is_empty() {
                    self.pending_space = true;
                }
                rest = trimmed;
                continue;
            }
            let end = rest
                .find(|c: char| c.is_ascii_whitespace())
                .unwrap_or(rest.len());
            self.push_word_text(&rest[..end], style);
            rest = &rest[end..];
        }
    }

    fn start(&mut self, name: &str, attrs: &[Attribute<'_>], self_closing: bool, body: Option<&str>) {
        let leaf = elements::is_void(name) || elements::has_opaque_body(name) || self_closing;
        if self.hidden() {
            // Track nesting only, so end tags still pair up.
            if !leaf {
                let kind = if name == "title" { Kind::Title } else { Kind::Inline };
                self.stack.push(Open {
                    name: name.to_string(),
                    kind,
                });
            }
            return;
        }
        match name {
            "br" => {
                self.line_break();
                return;
            }
            "hr" => {
                self.flush();
                self.blank_line();
                self.lines.push(RenderedLine::new(
                    "─".repeat(self.width),
                    LineType::HorizontalRule,
                ));
                return;
            }
            "img" => {
                let label = match attr(attrs, "alt").filter(|alt| !alt.trim().is_empty()) {
                    Some(alt) => format!("[image: {}]", alt.trim()),
                    None => "[image]".to_string(),
                };
                self.placeholder(&label);
                return;
            }
            "input" => {
                if let Some(label) = input_placeholder(attrs) {
                    self.placeholder(&label);
                }
                return;
            }
            "select" => self.placeholder("[select ▾]"),
            "pre" | "textarea" => {
                self.preformatted(name, body.unwrap_or_default());
                return;
            }
            _ => {}
        }
        if leaf {
            return;
        }

        let kind = if name == "title" {
            Kind::Title
        } else if is_one_of(HIDDEN_ELEMENTS, name) || name == "select" {
            Kind::Hidden
        } else if name == "a" {
            Kind::Link(attr(attrs, "href").map(str::to_string))
        } else if name == "button" {
            let style = InlineStyle {
                placeholder: true,
                ..self.inline_style()
            };
            self.push_word_text("[", style);
            Kind::Button
        } else if name == "ul" || name == "ol" {
            let start = attr(attrs, "start")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1);
            Kind::List {
                ordered: name == "ol",
                next: start,
            }
        } else if name == "li" {
            let bullet = self.next_bullet();
            let bullet_width = bullet.width();
            self.flush();
            self.bullet = Some(bullet);
            Kind::ListItem { bullet_width }
        } else if name == "tr" {
            Kind::Row { cells: 0 }
        } else if name == "td" || name == "th" {
            let mut separate = false;
            if let Some(Kind::Row { cells }) = self
                .stack
                .iter_mut()
                .rev()
                .map(|o| &mut o.kind)
                .find(|k| matches!(k, Kind::Row { .. }))
            {
                separate = *cells > 0;
                *cells += 1;
            }
            if separate {
                self.pending_space = true;
                self.push_word_text("|", InlineStyle::default());
                self.pending_space = true;
            }
            Kind::Inline
        } else if name == "blockquote" {
            Kind::Quote
        } else if is_one_of(BLOCK_ELEMENTS, name) {
            Kind::Block
        } else {
            Kind::Inline
        };

        if matches!(
            kind,
            Kind::Block | Kind::Quote | Kind::List { .. } | Kind::Row { .. }
        ) {
            self.flush();
        }
        let nested_list = matches!(kind, Kind::List { .. }) && self.list_depth() > 0;
        if is_one_of(SPACED_ELEMENTS, name) || (matches!(kind, Kind::List { .. }) && !nested_list)
        {
            self.blank_line();
        }
        self.stack.push(Open {
            name: name.to_string(),
            kind,
        });
    }

    fn end(&mut self, name: &str) {
        let Some(index) = self.stack.iter().rposition(|o| o.name == name) else {
            return;
        };
        while self.stack.len() > index {
            if let Some(open) = self.stack.pop() {
                self.close(open);
            }
        }
    }

    fn close(&mut self, open: Open) {
        match open.kind {
            Kind::Inline | Kind::Title | Kind::Hidden => {}
            Kind::Link(href) => {
                if let Some(href) = href.filter(|h| !h.trim().is_empty()) {
                    self.pending_space = true;
                    let label = format!("({})", clean_inline(&href));
                    self.push_word_text(&label, InlineStyle::default());
                }
            }
            Kind::Button => {
                let style = InlineStyle {
                    placeholder: true,
                    ..self.inline_style()
                };
                self.push_word_text("]", style);
            }
            Kind::ListItem { .. } => {
                // Restore the item context so its lines get the right type.
                self.stack.push(open);
                if self.words.is_empty() && self.bullet.is_some() {
                    let prefix = self.first_prefix();
                    self.lines.push(RenderedLine::new(prefix, self.line_type()));
                } else {
                    self.flush();
                }
                self.stack.pop();
                self.bullet = None;
            }
            Kind::Block | Kind::Quote | Kind::Row { .. } | Kind::List { .. } => {
                self.stack.push(open);
                self.flush();
                let spaced = self.stack.last().is_some_and(|o| {
                    is_one_of(SPACED_ELEMENTS, &o.name)
                        || (matches!(o.kind, Kind::List { .. }) && self.list_depth() == 1)
                });
                self.stack.pop();
                if spaced {
                    self.blank_line();
                }
            }
        }
    }

    fn next_bullet(&mut self) -> String {
        let depth = self.list_depth();
        let list = self.stack.iter_mut().rev().find_map(|o| match &mut o.kind {
            Kind::List { ordered, next } => Some((*ordered, next)),
            _ => None,
        });
        match list {
            Some((true, next)) => {
                let bullet = format!("{next}. ");
                *next += 1;
                bullet
            }
            _ if depth > 1 => "◦ ".to_string(),
            _ => "• ".to_string(),
        }
    }

    fn line_break(&mut self) {
        if self.hidden() {
            return;
        }
        if self.words.is_empty() && self.bullet.is_none() {
            let prefix = self.indent();
            self.lines.push(RenderedLine::new(prefix, self.line_type()));
        } else {
            self.flush();
        }
    }

    fn preformatted(&mut self, name: &str, body: &str) {
        self.flush();
        if name == "pre" {
            self.blank_line();
        }
        // Tags inside <pre> still only contribute their text.
        let mut text = String::new();
        for token in tokenize_lenient(body) {
            if let Token::Text(chunk) = token {
                text.push_str(chunk);
            }
        }
        let text = clean(&text);
        let text = text.strip_prefix('\n').unwrap_or(&text);
        let text = text.strip_suffix('\n').unwrap_or(text);
        if text.is_empty() {
            return;
        }
        let prefix = self.first_prefix();
        let rest = self.indent();
        for (i, line) in text.split('\n').enumerate() {
            let lead = if i == 0 { &prefix } else { &rest };
            let spans = vec![
                InlineSpan::new(lead.clone(), InlineStyle::default()),
                InlineSpan::new(line.to_string(), InlineStyle::default()),
            ];
            self.lines
                .push(RenderedLine::from_spans(LineType::CodeBlock, spans));
        }
        if name == "pre" {
            self.blank_line();
        }
    }

    /// Lay out the collected words as wrapped lines of the current block.
    fn flush(&mut self) {
        self.pending_space = false;
        if self.words.is_empty() {
            return;
        }
        let words = std::mem::take(&mut self.words);
        let line_type = self.line_type();
        let first = self.first_prefix();
        let rest = self.indent();
        for spans in wrap(&words, &first, &rest, self.width) {
            self.lines.push(RenderedLine::from_spans(line_type, spans));
        }
    }
}

fn input_placeholder(attrs: &[Attribute<'_>]) -> Option<String> {
    let kind = attr(attrs, "type").unwrap_or("text").to_ascii_lowercase();
    let checked = attrs.iter().any(|a| a.name.eq_ignore_ascii_case("checked"));
    let value = attr(attrs, "value").filter(|v| !v.is_empty());
    let label = match kind.as_str() {
        "hidden" => return None,
        "checkbox" => if checked { "[x]" } else { "[ ]" }.to_string(),
        "radio" => if checked { "(•)" } else { "( )" }.to_string(),
        "submit" | "button" | "reset" => format!("[ {} ]", value.unwrap_or(kind.as_str())),
        _ => {
            let shown = value
                .or_else(|| attr(attrs, "placeholder").filter(|p| !p.is_empty()))
                .unwrap_or("__________");
            format!("[{shown}]")
        }
    };
    Some(label)
}

fn push_span(spans: &mut Vec<InlineSpan>, text: &str, style: InlineStyle) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut()
        && last.style() == style
    {
        let merged = format!("{}{text}", last.text());
        *last = InlineSpan::new(merged, style);
        return;
    }
    spans.push(InlineSpan::new(text.to_string(), style));
}

/// Greedy word wrap by display width. Words wider than a line are split
/// between characters.
fn wrap(words: &[Word], first_prefix: &str, rest_prefix: &str, width: usize) -> Vec<Vec<InlineSpan>> {
    let mut lines = Vec::new();
    let mut prefix = first_prefix;
    let mut line: Vec<InlineSpan> = Vec::new();
    let mut used = 0;
    let available = |prefix: &str| width.saturating_sub(prefix.width()).max(1);

    let mut finish = |line: &mut Vec<InlineSpan>, prefix: &str| {
        let mut spans = vec![InlineSpan::new(prefix.to_string(), InlineStyle::default())];
        spans.append(line);
        lines.push(spans);
    };

    for word in words {
        let word_width = word.width();
        let room = available(prefix);
        if used > 0 && used + 1 + word_width > room {
            finish(&mut line, prefix);
            prefix = rest_prefix;
            used = 0;
        }
        if used > 0 && word.space_before {
            push_span(&mut line, " ", InlineStyle::default());
            used += 1;
        }
        if used + word_width <= available(prefix) {
            for span in &word.spans {
                push_span(&mut line, span.text(), span.style());
            }
            used += word_width;
            continue;
        }
        for span in &word.spans {
            for ch in span.text().chars() {
                let ch_width = ch.width().unwrap_or(0);
                if used > 0 && used + ch_width > available(prefix) {
                    finish(&mut line, prefix);
                    prefix = rest_prefix;
                    used = 0;
                }
                let mut buf = [0u8; 4];
                push_span(&mut line, ch.encode_utf8(&mut buf), span.style());
                used += ch_width;
            }
        }
    }
    if !line.is_empty() {
        finish(&mut line, prefix);
    }
    lines
}
