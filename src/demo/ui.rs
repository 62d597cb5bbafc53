//! UI rendering

use super::app::{App, Pane};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub(crate) const TITLE_HEIGHT: u16 = 1;
pub(crate) const PANES_MIN_HEIGHT: u16 = 8;
pub(crate) const SCOPES_HEIGHT: u16 = 6;
pub(crate) const LOG_HEIGHT: u16 = 8;
pub(crate) const STATUS_BAR_HEIGHT: u16 = 1;

pub(crate) fn split_main_chunks(area: Rect) -> [Rect; 5] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TITLE_HEIGHT),
            Constraint::Min(PANES_MIN_HEIGHT),
            Constraint::Length(SCOPES_HEIGHT),
            Constraint::Length(LOG_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3], chunks[4]]
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default().borders(Borders::ALL).border_style(style).title(title)
}

pub fn draw(f: &mut Frame, app: &App) {
    let [title_area, panes_area, scopes_area, log_area, status_area] = split_main_chunks(f.area());

    let title = Line::from(vec![
        Span::styled("keyscope", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  nested key scopes demo"),
    ]);
    f.render_widget(Paragraph::new(title), title_area);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(panes_area);
    draw_list(f, app, panes[0]);
    draw_editor(f, app, panes[1]);
    draw_scopes(f, app, scopes_area);
    draw_log(f, app, log_area);
    f.render_widget(
        Paragraph::new(app.status.as_str()).style(Style::default().fg(Color::Cyan)),
        status_area,
    );

    if app.show_help {
        draw_help(f, app);
    }
}

fn draw_list(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused_pane() == Some(Pane::List);
    let lines: Vec<Line> = app
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if i == app.selected {
                Line::styled(format!("> {}", item), Style::default().add_modifier(Modifier::REVERSED))
            } else {
                Line::raw(format!("  {}", item))
            }
        })
        .collect();
    let scroll = app.selected.saturating_sub(area.height.saturating_sub(3) as usize) as u16;
    f.render_widget(
        Paragraph::new(lines).block(pane_block("list", focused)).scroll((scroll, 0)),
        area,
    );
}

fn draw_editor(f: &mut Frame, app: &App, area: Rect) {
    if !app.editor_open() {
        f.render_widget(
            Paragraph::new("editor closed (C-e reopens it)").block(pane_block("editor", false)),
            area,
        );
        return;
    }
    let focused = app.focused_pane() == Some(Pane::Editor);
    let body = match app.opened.and_then(|i| app.items.get(i)) {
        Some(item) => format!("editing {}\n\nsaves this session: {}", item, app.saves),
        None => "no file open (Enter in the list opens one)".to_string(),
    };
    f.render_widget(
        Paragraph::new(body).block(pane_block("editor", focused)).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_scopes(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .scope_statuses()
        .into_iter()
        .map(|status| {
            let marker = if status.focused { "*" } else { " " };
            let handled = status.last_handled.unwrap_or_else(|| "-".to_string());
            Line::raw(format!("{} {:<10} last handled below: {}", marker, status.name, handled))
        })
        .collect();
    f.render_widget(Paragraph::new(lines).block(pane_block("scopes", false)), area);
}

fn draw_log(f: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .log
        .iter()
        .skip(app.log.len().saturating_sub(visible))
        .map(|line| Line::raw(line.as_str()))
        .collect();
    f.render_widget(Paragraph::new(lines).block(pane_block("handled", false)), area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_help(f: &mut Frame, app: &App) {
    let bindings = app.focused_bindings();
    let lines: Vec<Line> = bindings
        .iter()
        .map(|(action, keys)| Line::raw(format!("{:<16} {}", action, keys)))
        .collect();
    let area = centered_rect(56, bindings.len() as u16 + 2, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(pane_block("bindings in focus (Esc closes)", true)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered_rect(60, 4, area);
        assert_eq!(rect.width, 40);
        assert_eq!(rect.y, 3);
    }

    #[test]
    fn main_chunks_reserve_fixed_rows() {
        let [title, panes, scopes, log, status] = split_main_chunks(Rect::new(0, 0, 80, 40));
        assert_eq!(title.height, TITLE_HEIGHT);
        assert_eq!(scopes.height, SCOPES_HEIGHT);
        assert_eq!(log.height, LOG_HEIGHT);
        assert_eq!(status.height, STATUS_BAR_HEIGHT);
        assert_eq!(panes.height, 40 - TITLE_HEIGHT - SCOPES_HEIGHT - LOG_HEIGHT - STATUS_BAR_HEIGHT);
    }
}
