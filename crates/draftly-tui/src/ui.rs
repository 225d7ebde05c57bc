use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus};
use draftly_core::{ChatRole, EditAction, ToolbarState};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    // Document on the left, chat sidebar on the right
    let [editor_area, chat_area] = Layout::horizontal([
        Constraint::Percentage(65),
        Constraint::Percentage(35),
    ])
    .areas(body_area);

    render_header(app, frame, header_area);
    render_editor(app, frame, editor_area);
    render_chat(app, frame, chat_area);
    render_footer(app, frame, footer_area);

    if app.toolbar.state() != ToolbarState::Hidden {
        render_toolbar(app, frame, editor_area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Draftly ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("v{} ", env!("CARGO_PKG_VERSION")), Style::default().fg(Color::DarkGray)),
        Span::styled(app.status.as_str(), Style::default().fg(Color::White)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: &[(&str, &str)] = match (app.focus, app.toolbar.state()) {
        (Focus::Editor, ToolbarState::Reviewing) => &[("Enter", "confirm"), ("Esc", "back")],
        (Focus::Editor, ToolbarState::Menu) => &[("F1-F4", "AI action"), ("Esc", "deselect")],
        (Focus::Editor, ToolbarState::Hidden) => &[
            ("Shift+arrows", "select"),
            ("Alt+b/i", "bold/italic"),
            ("Alt+1-6", "heading"),
            ("Alt+l", "list"),
            ("Tab", "chat"),
        ],
        (Focus::Chat, _) => &[("Enter", "send"), ("/search", "web"), ("Tab", "editor")],
    };

    let mode = match app.focus {
        Focus::Editor => Span::styled(" EDIT ", Style::default().bg(Color::Blue).fg(Color::White)),
        Focus::Chat => Span::styled(" CHAT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let mut spans = vec![mode];
    for (key, label) in keys {
        spans.push(Span::styled(format!(" {key} "), key_style));
        spans.push(Span::styled(format!(" {label} "), label_style));
    }
    spans.push(Span::styled(" ^C ", key_style));
    spans.push(Span::styled(" quit ", label_style));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_editor(app: &mut App, frame: &mut Frame, area: Rect) {
    app.editor_area = area;
    app.scroll_to_cursor();

    let focused = app.focus == Focus::Editor;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Document ");

    let selection = app.editor.selection();
    let highlight = Style::default().bg(Color::Blue).fg(Color::White);

    let mut lines = Vec::new();
    let mut idx = 0;
    for text_line in app.editor.text().split('\n') {
        let mut spans = Vec::new();
        for c in text_line.chars() {
            let style = if idx >= selection.start() && idx < selection.end() {
                highlight
            } else {
                Style::default()
            };
            spans.push(Span::styled(c.to_string(), style));
            idx += 1;
        }
        lines.push(Line::from(spans));
        idx += 1; // line break
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.editor_scroll, 0));
    frame.render_widget(paragraph, area);

    if focused && app.toolbar.state() == ToolbarState::Hidden {
        let (line, col) = draftly_core::editor::line_col(app.editor.text(), selection.head);
        let y = (line as u16).saturating_sub(app.editor_scroll);
        frame.set_cursor_position((
            area.x + 1 + (col as u16).min(area.width.saturating_sub(3)),
            area.y + 1 + y,
        ));
    }
}

fn render_toolbar(app: &App, frame: &mut Frame, editor_area: Rect) {
    let Some(ctx) = app.toolbar.context() else {
        return;
    };

    let width = 48.min(editor_area.width);
    let mut lines: Vec<Line> = Vec::new();
    let title;

    match app.toolbar.state() {
        ToolbarState::Reviewing => {
            title = " AI Suggestion ";
            lines.push(Line::from(Span::styled("Original:", Style::default().fg(Color::DarkGray).bold())));
            lines.push(Line::from(ctx.selected_text.as_str()));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("Suggestion:", Style::default().fg(Color::Yellow).bold())));
            for line in ctx.suggestion.as_deref().unwrap_or_default().lines() {
                lines.push(Line::from(line));
            }
        }
        _ if ctx.loading => {
            title = " AI ";
            let dots = ".".repeat(app.animation_frame as usize + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{dots}"),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        _ => {
            title = " AI ";
            for (i, action) in EditAction::all().iter().enumerate() {
                lines.push(Line::from(vec![
                    Span::styled(format!(" F{} ", i + 1), Style::default().bg(Color::DarkGray).fg(Color::White)),
                    Span::raw(format!(" {}", action.label())),
                ]));
            }
        }
    }

    // Wrapped height is approximate; clamp to the editor pane
    let inner = width.saturating_sub(2).max(1) as usize;
    let wrapped: usize = lines.iter().map(|l| l.width() / inner + 1).sum();
    let height = (wrapped as u16 + 2).min(editor_area.height);

    let x = ctx.position.left.min(editor_area.right().saturating_sub(width));
    let y = ctx
        .position
        .top
        .max(editor_area.y)
        .min(editor_area.bottom().saturating_sub(height));
    let popup_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(title);
    let popup = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(popup, popup_area);
}

fn render_chat(app: &App, frame: &mut Frame, area: Rect) {
    let [history_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let focused = app.focus == Focus::Chat;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Assistant ");

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.chat.messages() {
        let (label, color) = match msg.role {
            ChatRole::User => ("You:", Color::Cyan),
            ChatRole::Assistant => ("AI:", Color::Yellow),
            ChatRole::System => ("System:", Color::DarkGray),
        };
        lines.push(Line::from(Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))));
        for line in msg.content.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    if app.chat.is_loading() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Keep the newest message in view
    let wrap_width = history_area.width.saturating_sub(2).max(1) as usize;
    let total: usize = lines.iter().map(|l| l.width() / wrap_width + 1).sum();
    let visible = history_area.height.saturating_sub(2) as usize;
    let scroll = total.saturating_sub(visible) as u16;

    let history = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((scroll, 0));
    frame.render_widget(history, history_area);

    // Input with horizontal scrolling to keep the cursor visible
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat.cursor();
    let scroll_offset = if inner_width > 0 && cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };
    let visible_text: String = app.chat.input().chars().skip(scroll_offset).take(inner_width).collect();

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Yellow } else { Color::DarkGray }))
        .title(" Ask (Tab to focus) ");
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if focused {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}
