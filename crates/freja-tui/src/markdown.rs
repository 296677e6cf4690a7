use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// A styled line ready for Ratatui rendering.
pub type StyledLines = Vec<Line<'static>>;

pub(crate) fn bullet(ascii: bool) -> &'static str {
    if ascii { "- " } else { "• " }
}

pub(crate) fn rule_char(ascii: bool) -> char {
    if ascii { '-' } else { '─' }
}

/// Convert a markdown string into a list of styled [`Line`]s for Ratatui.
///
/// `ascii` — when true, use plain ASCII characters instead of Unicode
/// glyphs so that fonts without wide Unicode support render cleanly.
pub fn render_markdown(md: &str, wrap_width: u16, ascii: bool) -> StyledLines {
    let width = if wrap_width == 0 { 80 } else { wrap_width as usize };
    let mut lines: StyledLines = Vec::new();
    let mut current_spans: Vec<Span<'static>> = Vec::new();
    let mut style_stack: Vec<Style> = vec![Style::default()];

    let push_line = |lines: &mut StyledLines, spans: &mut Vec<Span<'static>>| {
        if spans.is_empty() {
            lines.push(Line::default());
        } else {
            lines.push(Line::from(std::mem::take(spans)));
        }
    };

    let parser = Parser::new(md);
    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                push_line(&mut lines, &mut current_spans);
                style_stack.push(heading_style(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                style_stack.pop();
                push_line(&mut lines, &mut current_spans);
            }
            Event::Start(Tag::Strong) => {
                let base = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(base.add_modifier(Modifier::BOLD));
            }
            Event::End(TagEnd::Strong) => {
                style_stack.pop();
            }
            Event::Start(Tag::Emphasis) => {
                let base = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(base.add_modifier(Modifier::ITALIC));
            }
            Event::End(TagEnd::Emphasis) => {
                style_stack.pop();
            }
            Event::Start(Tag::CodeBlock(_)) => {
                push_line(&mut lines, &mut current_spans);
                style_stack.push(Style::default().fg(Color::Cyan));
            }
            Event::End(TagEnd::CodeBlock) => {
                push_line(&mut lines, &mut current_spans);
                style_stack.pop();
            }
            Event::Start(Tag::List(_)) => {
                push_line(&mut lines, &mut current_spans);
            }
            Event::End(TagEnd::List(_)) => {}
            Event::Start(Tag::Item) => {
                current_spans.push(Span::raw(format!("  {}", bullet(ascii))));
            }
            Event::End(TagEnd::Item) => {
                push_line(&mut lines, &mut current_spans);
            }
            Event::Start(Tag::Link { .. }) => {
                let base = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(base.fg(Color::Blue).add_modifier(Modifier::UNDERLINED));
            }
            Event::End(TagEnd::Link) => {
                style_stack.pop();
            }
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                push_line(&mut lines, &mut current_spans);
            }
            Event::Text(t) => {
                let style = *style_stack.last().unwrap_or(&Style::default());
                // Greedy word wrap at `width` columns.
                let mut col = current_col(&current_spans);
                let mut buf = String::new();
                for word in t.split_inclusive(' ') {
                    let w = word.width();
                    if col + w > width && !buf.is_empty() {
                        current_spans.push(Span::styled(buf.clone(), style));
                        buf.clear();
                        push_line(&mut lines, &mut current_spans);
                        col = 0;
                    }
                    buf.push_str(word);
                    col += w;
                }
                if !buf.is_empty() {
                    current_spans.push(Span::styled(buf, style));
                }
            }
            Event::Code(t) => {
                let style = Style::default().fg(Color::Yellow).bg(Color::DarkGray);
                current_spans.push(Span::styled(format!("`{t}`"), style));
            }
            Event::SoftBreak => {
                current_spans.push(Span::raw(" "));
            }
            Event::HardBreak => {
                push_line(&mut lines, &mut current_spans);
            }
            Event::Rule => {
                push_line(&mut lines, &mut current_spans);
                lines.push(Line::from(Span::styled(
                    rule_char(ascii).to_string().repeat(width),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            _ => {}
        }
    }
    if !current_spans.is_empty() {
        lines.push(Line::from(current_spans));
    }

    // Drop trailing blank lines left by block-end handling.
    while lines.last().is_some_and(|l| l.spans.is_empty()) {
        lines.pop();
    }
    lines
}

fn current_col(spans: &[Span<'static>]) -> usize {
    spans.iter().map(|s| s.content.width()).sum()
}

fn heading_style(level: HeadingLevel) -> Style {
    let base = Style::default().add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => base.fg(Color::Magenta),
        HeadingLevel::H2 => base.fg(Color::Blue),
        _ => base.fg(Color::Cyan),
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &StyledLines) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    #[test]
    fn bold_text_gets_bold_modifier() {
        let lines = render_markdown("**important**", 80, false);
        let span = &lines[0].spans[0];
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(span.content.as_ref(), "important");
    }

    #[test]
    fn bullet_list_items_get_bullet_prefix() {
        let lines = render_markdown("- one\n- two", 80, false);
        let texts = text_of(&lines);
        assert!(texts.iter().any(|t| t.contains("• one")), "got: {texts:?}");
        assert!(texts.iter().any(|t| t.contains("• two")), "got: {texts:?}");
    }

    #[test]
    fn ascii_mode_uses_dash_bullets() {
        let lines = render_markdown("- one", 80, true);
        let texts = text_of(&lines);
        assert!(texts.iter().any(|t| t.contains("- one")), "got: {texts:?}");
    }

    #[test]
    fn heading_is_bold_on_its_own_line() {
        let lines = render_markdown("# Title\nbody", 80, false);
        let texts = text_of(&lines);
        assert!(texts.iter().any(|t| t == "Title"), "got: {texts:?}");
        let title_line = lines.iter().find(|l| !l.spans.is_empty()).unwrap();
        assert!(title_line.spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn inline_code_keeps_backticks() {
        let lines = render_markdown("run `cargo test` now", 80, false);
        let texts = text_of(&lines);
        assert!(texts.iter().any(|t| t.contains("`cargo test`")), "got: {texts:?}");
    }

    #[test]
    fn long_paragraph_wraps_at_width() {
        let md = "aaaa bbbb cccc dddd eeee ffff";
        let lines = render_markdown(md, 12, false);
        assert!(lines.len() > 1, "must wrap into multiple lines");
        for t in text_of(&lines) {
            assert!(t.len() <= 13, "line exceeds wrap width: {t:?}");
        }
    }

    #[test]
    fn empty_input_produces_no_lines() {
        assert!(render_markdown("", 80, false).is_empty());
    }
}
