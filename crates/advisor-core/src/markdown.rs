//! Markdown → HTML for chat bubbles and exported transcripts.
//!
//! Links open in a new browsing context with no opener reference, raw HTML
//! from the model is shown as text, and code blocks keep their whitespace.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::state::Message;

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "irc", "ircs", "xmpp"];

pub fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Render one message as a styled bubble.
pub fn render_message_html(message: &Message) -> String {
    format!(
        "<div class=\"message-bubble {}\" data-id=\"{}\"><div class=\"markdown-content\">{}</div></div>",
        message.role().css_class(),
        message.id().0,
        render_markdown_html(message.text())
    )
}

pub fn render_markdown_html(text: &str) -> String {
    let parser = Parser::new_ext(text, parser_options()).map(|event| match event {
        // Untrusted markup is displayed, not interpreted
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link { dest_url, title, .. }) => Event::Html(CowStr::from(open_link(&dest_url, &title))),
        Event::End(TagEnd::Link) => Event::Html(CowStr::Borrowed("</a>")),
        Event::Start(Tag::Image { link_type, dest_url, title, id }) => {
            let src = safe_href(&dest_url).unwrap_or("").to_string();
            Event::Start(Tag::Image {
                link_type,
                dest_url: CowStr::from(src),
                title,
                id,
            })
        }
        Event::Start(Tag::CodeBlock(_)) => Event::Html(CowStr::Borrowed(
            "<pre><code style=\"display: block; white-space: pre-wrap\">",
        )),
        Event::End(TagEnd::CodeBlock) => Event::Html(CowStr::Borrowed("</code></pre>\n")),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn open_link(dest: &str, title: &str) -> String {
    let mut tag = String::from("<a");
    if let Some(href) = safe_href(dest) {
        tag.push_str(" href=\"");
        tag.push_str(&escape_attr(href));
        tag.push('"');
    }
    if !title.is_empty() {
        tag.push_str(" title=\"");
        tag.push_str(&escape_attr(title));
        tag.push('"');
    }
    tag.push_str(" target=\"_blank\" rel=\"noopener noreferrer\">");
    tag
}

/// Applies to link targets and image sources. Relative URLs and an
/// allow-list of schemes pass; anything else
/// (`javascript:`, `data:`, ...) is dropped.
fn safe_href(dest: &str) -> Option<&str> {
    let dest = dest.trim();
    let colon = match dest.find(':') {
        Some(i) => i,
        None => return Some(dest),
    };
    // A ':' after a path, query or fragment delimiter is not a scheme
    if dest[..colon].contains(&['/', '?', '#'][..]) {
        return Some(dest);
    }
    let scheme = dest[..colon].to_ascii_lowercase();
    SAFE_SCHEMES.contains(&scheme.as_str()).then_some(dest)
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Standalone HTML page for a whole conversation.
pub fn render_transcript_html(title: &str, messages: &[Message]) -> String {
    let mut body = String::new();
    for message in messages {
        body.push_str(&render_message_html(message));
        body.push('\n');
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; background: #f5f5f5; }}
.chat-container {{ max-width: 800px; margin: auto; display: flex; flex-direction: column; gap: 8px; padding: 16px; }}
.message-bubble {{ padding: 16px; border-radius: 20px; max-width: 70%; box-shadow: 0 2px 5px rgba(0,0,0,0.1); word-break: break-word; }}
.message-bubble.user {{ align-self: flex-end; background: #2196f3; color: white; border-radius: 20px 20px 4px 20px; }}
.message-bubble.assistant {{ align-self: flex-start; background: #ffffff; color: black; border-radius: 20px 20px 20px 4px; }}
.markdown-content p {{ margin: 0 0 8px 0; }}
.markdown-content code {{ background: rgba(0,0,0,0.06); padding: 2px 4px; border-radius: 4px; font-size: 0.9em; }}
.markdown-content pre {{ background: rgba(0,0,0,0.06); padding: 8px; border-radius: 4px; overflow-x: auto; }}
.markdown-content table {{ border-collapse: collapse; width: 100%; margin: 8px 0; }}
.markdown-content th, .markdown-content td {{ border: 1px solid rgba(0,0,0,0.12); padding: 6px; }}
.markdown-content blockquote {{ border-left: 4px solid rgba(0,0,0,0.12); margin: 8px 0; padding: 4px 12px; }}
.message-bubble.user a {{ color: white; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div class="chat-container">
{body}</div>
</body>
</html>
"#,
        title = escape_attr(title),
        body = body
    )
}
