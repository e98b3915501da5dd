use chrono::NaiveDateTime;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::form::{Form, FormField};
use crate::storage::KeyValueStorage;

use super::app::{AppState, DeleteConfirmState, StatusKind};

const TASK_WIDTH: usize = 28;
const DUE_WIDTH: usize = 19;
const PRIORITY_WIDTH: usize = 8;
const HELP_KEY_WIDTH: usize = 10;
const COLOR_TEXT: Color = Color::Rgb(234, 236, 239);
const COLOR_MUTED: Color = Color::Rgb(160, 165, 172);
const COLOR_MUTED_DARK: Color = Color::Rgb(118, 124, 130);
const COLOR_BG_MUTED: Color = Color::Rgb(52, 56, 60);
const COLOR_INFO: Color = Color::Rgb(116, 198, 219);
const COLOR_WARNING: Color = Color::Rgb(244, 200, 98);
const COLOR_ERROR: Color = Color::Rgb(255, 107, 107);
const COLOR_SUCCESS: Color = Color::Rgb(126, 210, 146);
const COLOR_ACCENT: Color = Color::Rgb(122, 170, 255);
const COLOR_BORDER_LIST: Color = Color::Rgb(92, 126, 166);

pub fn render<S: KeyValueStorage>(frame: &mut Frame, app: &AppState<S>, now: NaiveDateTime) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);

    render_title(frame, chunks[0]);
    render_forms(frame, app, chunks[1], now);
    render_footer(frame, app, chunks[2], now);

    if app.show_help {
        render_help_modal(frame, area);
    }
    if let Some(confirm) = app.delete_confirm.as_ref() {
        render_delete_confirm_modal(frame, area, confirm);
    }
}

fn render_title(frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " tasklist ",
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("press ? for keys", Style::default().fg(COLOR_MUTED_DARK)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_forms<S: KeyValueStorage>(
    frame: &mut Frame,
    app: &AppState<S>,
    area: Rect,
    now: NaiveDateTime,
) {
    let forms = app.controller.forms();
    let height = area.height.saturating_sub(2) as usize;
    let (start, end) = list_window(forms.len(), app.selected, height);

    let mut lines: Vec<Line<'static>> = Vec::new();
    if forms.is_empty() {
        lines.push(Line::from(Span::styled(
            "No tasks. Press n to add one.",
            Style::default().fg(COLOR_MUTED),
        )));
    }
    for (idx, form) in forms.iter().enumerate().take(end).skip(start) {
        let selected = app.selected == Some(idx);
        let active = if selected { app.active_field } else { None };
        let overdue = app.highlight_overdue
            && form
                .fields()
                .to_task()
                .map(|task| task.is_overdue(now))
                .unwrap_or(false);
        lines.push(render_form_row(form, selected, active, overdue));
    }

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_BORDER_LIST))
            .title("Tasks"),
    );
    frame.render_widget(widget, area);
}

fn render_form_row(
    form: &Form,
    selected: bool,
    active: Option<FormField>,
    overdue: bool,
) -> Line<'static> {
    let view = form.view();
    let base = if selected {
        Style::default().bg(COLOR_BG_MUTED)
    } else {
        Style::default()
    };
    let value_style = if view.fields_enabled {
        base.fg(COLOR_TEXT)
    } else {
        base.fg(COLOR_MUTED)
    };

    let mut spans = vec![Span::styled(if selected { "> " } else { "  " }, base)];
    for (field, width) in [
        (FormField::Task, TASK_WIDTH),
        (FormField::DueDate, DUE_WIDTH),
        (FormField::Priority, PRIORITY_WIDTH),
    ] {
        let raw = form.fields().get(field);
        let (text, mut style) = if raw.is_empty() {
            (field.placeholder().to_string(), base.fg(COLOR_MUTED_DARK))
        } else {
            (raw.to_string(), value_style)
        };
        if field == FormField::DueDate && overdue {
            style = style.fg(COLOR_ERROR);
        }
        if active == Some(field) {
            style = style.fg(COLOR_ACCENT).add_modifier(Modifier::UNDERLINED);
        }
        let text = if active == Some(field) {
            format!("{}_", tail_text(raw, width.saturating_sub(1)))
        } else {
            truncate_text(&text, width)
        };
        spans.push(Span::styled(format!("{text:<width$} "), style));
    }

    if view.save_visible {
        spans.push(button("Save", COLOR_SUCCESS, base));
    }
    if view.edit_visible {
        spans.push(button("Edit", COLOR_INFO, base));
    }
    if view.delete_visible {
        spans.push(button("Delete", COLOR_ERROR, base));
    }
    Line::from(spans)
}

fn button(label: &'static str, color: Color, base: Style) -> Span<'static> {
    Span::styled(format!("[{label}] "), base.fg(color))
}

fn render_footer<S: KeyValueStorage>(
    frame: &mut Frame,
    app: &AppState<S>,
    area: Rect,
    now: NaiveDateTime,
) {
    let hint_span = Span::styled(app.footer_hint(), Style::default().fg(COLOR_INFO));
    let line = if let Some((status, kind)) = app.status_line() {
        let status_style = match kind {
            StatusKind::Error => Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
            StatusKind::Info => Style::default().fg(COLOR_WARNING),
        };
        Line::from(vec![
            hint_span,
            Span::raw("  |  "),
            Span::styled(status.to_string(), status_style),
        ])
    } else {
        Line::from(hint_span)
    };
    let counts_line = Line::from(Span::styled(
        app.count_summary(now),
        Style::default().fg(COLOR_ACCENT),
    ));
    let widget = Paragraph::new(vec![line, counts_line])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(COLOR_BORDER_LIST)),
        );
    frame.render_widget(widget, area);
}

fn render_delete_confirm_modal(frame: &mut Frame, area: Rect, state: &DeleteConfirmState) {
    let content_width = area.width.saturating_sub(8).min(56);
    let modal = centered_rect(content_width, 7, area);
    frame.render_widget(Clear, modal);

    let title_width = (content_width as usize).saturating_sub(8);
    let mut lines: Vec<Line<'static>> = vec![
        Line::from(Span::styled(
            state.message.clone(),
            Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if !state.title.trim().is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Task: ", Style::default().fg(COLOR_MUTED_DARK)),
            Span::styled(
                truncate_text(&state.title, title_width),
                Style::default().fg(COLOR_TEXT),
            ),
        ]));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "y/enter confirm  n/esc cancel",
        Style::default().fg(COLOR_MUTED_DARK),
    )));

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Delete"))
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, modal);
}

fn render_help_modal(frame: &mut Frame, area: Rect) {
    let width = area.width.saturating_sub(8).min(52);
    let modal = centered_rect(width, 18, area);
    frame.render_widget(Clear, modal);

    let width = width as usize;
    let lines = vec![
        help_header("Forms"),
        help_line("n", "new form", width),
        help_line("j/k", "move selection", width),
        help_line("tab", "type into fields", width),
        help_line("[ ]", "cycle priority", width),
        help_line("s/enter", "save", width),
        help_line("e", "edit committed form", width),
        help_line("d", "delete form", width),
        help_line("q", "quit", width),
        Line::from(""),
        help_header("Typing"),
        help_line("tab", "next field", width),
        help_line("backspace", "delete char", width),
        help_line("ctrl-u", "clear field", width),
        help_line("esc", "stop typing", width),
    ];
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    frame.render_widget(widget, modal);
}

fn help_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(COLOR_ACCENT)
            .add_modifier(Modifier::BOLD),
    ))
}

fn help_line(keys: &str, desc: &str, width: usize) -> Line<'static> {
    let desc_width = width.saturating_sub(HELP_KEY_WIDTH + 4);
    Line::from(vec![
        Span::styled(
            format!("{keys:<HELP_KEY_WIDTH$}"),
            Style::default().fg(COLOR_WARNING),
        ),
        Span::styled(truncate_text(desc, desc_width), Style::default().fg(COLOR_TEXT)),
    ])
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Rows `[start, end)` to draw so the selection stays visible.
fn list_window(total: usize, selected: Option<usize>, height: usize) -> (usize, usize) {
    if height == 0 || total <= height {
        return (0, total);
    }
    let selected = selected.unwrap_or(0).min(total - 1);
    let start = selected.saturating_sub(height - 1);
    (start, (start + height).min(total))
}

fn truncate_text(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 1 {
        return value.chars().take(width).collect();
    }
    let mut out: String = value.chars().take(width - 1).collect();
    out.push('~');
    out
}

/// Last `width` chars of `value`, so the caret end of typed text stays visible.
fn tail_text(value: &str, width: usize) -> String {
    let count = value.chars().count();
    if count <= width {
        return value.to_string();
    }
    if width <= 1 {
        return value.chars().skip(count - width).collect();
    }
    let mut out = String::from("~");
    out.extend(value.chars().skip(count - (width - 1)));
    out
}
