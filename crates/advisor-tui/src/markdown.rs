//! Markdown → styled terminal lines for chat bubbles.

use advisor_core::markdown::parser_options;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const CODE_STYLE: Style = Style::new().fg(Color::Yellow);
const QUOTE_STYLE: Style = Style::new().fg(Color::DarkGray);

#[derive(Default)]
struct TableBuf {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
    header_rows: usize,
}

struct Renderer {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
    links: Vec<String>,
    quote_depth: usize,
    in_code_block: bool,
    in_html_block: bool,
    table: Option<TableBuf>,
}

/// Render message text as terminal lines, starting from `base` style.
pub fn render_markdown_lines(text: &str, base: Style) -> Vec<Line<'static>> {
    let mut r = Renderer {
        lines: Vec::new(),
        current: Vec::new(),
        styles: vec![base],
        lists: Vec::new(),
        links: Vec::new(),
        quote_depth: 0,
        in_code_block: false,
        in_html_block: false,
        table: None,
    };

    for event in Parser::new_ext(text, parser_options()) {
        r.event(event);
    }
    r.flush();

    // Drop trailing blank lines left by the last block
    while r.lines.last().is_some_and(is_blank) {
        r.lines.pop();
    }
    r.lines
}

/// Empty apart from whitespace and quote gutters.
fn is_blank(line: &Line<'_>) -> bool {
    line.spans
        .iter()
        .all(|s| s.content.trim_matches(|c: char| c == '│' || c.is_whitespace()).is_empty())
}

impl Renderer {
    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let next = self.style().patch(patch);
        self.styles.push(next);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(table) = self.table.as_mut() {
            table.cell.push_str(text);
            return;
        }
        if self.in_code_block {
            self.verbatim(text, CODE_STYLE);
            return;
        }
        let style = self.style();
        if self.in_html_block {
            self.verbatim(text, style);
            return;
        }
        self.current.push(Span::styled(text.to_string(), style));
    }

    /// Line breaks in the source become line breaks on screen.
    fn verbatim(&mut self, text: &str, style: Style) {
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                self.current.push(Span::styled(part.to_string(), style));
            }
            if parts.peek().is_some() {
                self.flush_forced();
            }
        }
    }

    fn prefix(&self) -> Vec<Span<'static>> {
        (0..self.quote_depth)
            .map(|_| Span::styled("│ ", QUOTE_STYLE))
            .collect()
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.flush_forced();
        }
    }

    fn flush_forced(&mut self) {
        let mut spans = self.prefix();
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn blank(&mut self) {
        self.flush();
        let after_blank = self.lines.last().map_or(true, is_blank);
        if self.lists.is_empty() && !after_blank {
            self.lines.push(Line::from(self.prefix()));
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(t) | Event::Html(t) | Event::InlineHtml(t) => self.text(&t),
            Event::Code(code) => {
                if let Some(table) = self.table.as_mut() {
                    table.cell.push_str(&code);
                } else {
                    self.current.push(Span::styled(code.to_string(), CODE_STYLE));
                }
            }
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.flush_forced(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled("─".repeat(24), QUOTE_STYLE)));
            }
            Event::TaskListMarker(done) => self.text(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let mut style = Style::new().add_modifier(Modifier::BOLD);
                if level == HeadingLevel::H1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                self.push_style(style);
            }
            Tag::BlockQuote(..) => {
                self.flush();
                self.quote_depth += 1;
                self.push_style(Style::new().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
            }
            Tag::HtmlBlock => {
                self.flush();
                self.in_html_block = true;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current.push(Span::raw(format!("{}{}", "  ".repeat(depth), marker)));
            }
            Tag::Emphasis => self.push_style(Style::new().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::new().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.push_style(Style::new().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } => {
                self.links.push(dest_url.to_string());
                self.push_style(Style::new().fg(Color::Blue).add_modifier(Modifier::UNDERLINED));
            }
            Tag::Table(_) => {
                self.flush();
                self.table = Some(TableBuf::default());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.blank(),
            TagEnd::Heading(_) => {
                self.pop_style();
                self.blank();
            }
            TagEnd::BlockQuote(..) => {
                self.flush();
                self.pop_style();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::CodeBlock => {
                self.flush();
                self.in_code_block = false;
                self.blank();
            }
            TagEnd::HtmlBlock => {
                self.flush();
                self.in_html_block = false;
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(dest) = self.links.pop() {
                    if !dest.is_empty() {
                        self.text(&format!(" <{}>", dest));
                    }
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                    if tag == TagEnd::TableHead {
                        table.header_rows = table.rows.len();
                    }
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.table_lines(table);
                }
                self.blank();
            }
            _ => {}
        }
    }

    fn table_lines(&mut self, table: TableBuf) {
        let columns = table.rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let base = self.style();
        for (i, row) in table.rows.iter().enumerate() {
            let style = if i < table.header_rows {
                base.add_modifier(Modifier::BOLD)
            } else {
                base
            };
            let mut spans = self.prefix();
            spans.push(Span::styled("│", QUOTE_STYLE));
            for (c, width) in widths.iter().enumerate() {
                let cell = row.get(c).map(String::as_str).unwrap_or("");
                let pad = width - cell.chars().count();
                spans.push(Span::styled(format!(" {}{} ", cell, " ".repeat(pad)), style));
                spans.push(Span::styled("│", QUOTE_STYLE));
            }
            self.lines.push(Line::from(spans));

            if i + 1 == table.header_rows {
                let rule: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
                let mut spans = self.prefix();
                spans.push(Span::styled(format!("├{}┤", rule.join("┼")), QUOTE_STYLE));
                self.lines.push(Line::from(spans));
            }
        }
    }
}
