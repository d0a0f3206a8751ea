use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::app::App;
use crate::internal::board::HeadlineRow;
use crate::internal::fetcher::FetchOrigin;
use crate::utils::datetime::relative_time;

#[tracing::instrument(skip(app, f))]
pub fn draw(app: &mut App, f: &mut Frame) {
    let start = std::time::Instant::now();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_top_bar(app, f, chunks[0]);
    render_filters(app, f, chunks[1]);
    render_headlines(app, f, chunks[2]);
    render_status_bar(app, f, chunks[3]);

    if app.config.logging.enable_performance_metrics && cfg!(debug_assertions) {
        tracing::debug!(elapsed = ?start.elapsed(), "render.draw");
    }
}

/// Wrap a title to `width` columns, leaving `prefix_width` columns on the
/// first line for the source tag.
pub fn calculate_wrapped_title(title: &str, width: u16, prefix_width: u16) -> Vec<String> {
    let available = width.saturating_sub(prefix_width).max(10) as usize;
    textwrap::wrap(title, available)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

/// One-line plain-text form of a row: `[Source] title · 5m ago`.
pub fn format_row(row: &HeadlineRow) -> String {
    format!("[{}] {} · {}", row.source, row.title, row.relative_time)
}

fn render_top_bar(app: &App, f: &mut Frame, area: Rect) {
    let theme = app.theme();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(16)])
        .split(area);

    let title = Paragraph::new(Span::styled(
        " Headlines",
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .style(Style::default().bg(theme.background).fg(theme.foreground));
    f.render_widget(title, chunks[0]);

    let toggle = Paragraph::new(app.theme_controller.toggle_label())
        .alignment(Alignment::Right)
        .style(Style::default().bg(theme.background).fg(theme.timestamp));
    f.render_widget(toggle, chunks[1]);
}

fn render_filters(app: &App, f: &mut Frame, area: Rect) {
    let theme = app.theme();
    let mut spans = vec![Span::raw(" ")];
    for (index, button) in app.board.buttons().iter().enumerate() {
        let label = match index {
            1..=9 => format!(" {} {} ", index, button.filter.label()),
            0 => format!(" 0 {} ", button.filter.label()),
            _ => format!(" {} ", button.filter.label()),
        };
        let style = match button.active {
            true => Style::default()
                .bg(theme.filter_active_bg)
                .fg(theme.filter_active_fg)
                .add_modifier(Modifier::BOLD),
            false => Style::default().fg(theme.source_tag),
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }

    let p = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(theme.background).fg(theme.foreground));
    f.render_widget(p, area);
}

fn render_headlines(app: &mut App, f: &mut Frame, area: Rect) {
    let theme = app.theme().clone();
    // Borders take two columns; the trailing time needs its own room.
    let inner_width = area.width.saturating_sub(4);

    let items: Vec<ListItem> = app
        .board
        .visible_rows()
        .map(|row| {
            let tag = format!("[{}] ", row.source);
            let suffix = format!("  {}", row.relative_time);
            let prefix_width = (tag.chars().count() + suffix.chars().count()) as u16;
            let wrapped = calculate_wrapped_title(&row.title, inner_width, prefix_width);

            let mut lines = Vec::with_capacity(wrapped.len());
            for (i, part) in wrapped.into_iter().enumerate() {
                let mut spans = Vec::with_capacity(3);
                match i {
                    0 => spans.push(Span::styled(tag.clone(), Style::default().fg(theme.source_tag))),
                    _ => spans.push(Span::raw(" ".repeat(tag.chars().count()))),
                }
                spans.push(Span::styled(part, Style::default().fg(theme.foreground)));
                if i == 0 {
                    spans.push(Span::styled(suffix.clone(), Style::default().fg(theme.timestamp)));
                }
                lines.push(Line::from(spans));
            }
            ListItem::new(lines)
        })
        .collect();

    let title = match (app.board.rows().is_empty(), app.loading) {
        (true, true) => " Loading headlines… ".to_string(),
        (true, false) => " No headlines ".to_string(),
        _ => format!(" {} ", app.board.filter().label()),
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.background)),
        )
        .highlight_style(
            Style::default()
                .bg(theme.selection_bg)
                .fg(theme.selection_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_status_bar(app: &App, f: &mut Frame, area: Rect) {
    let theme = app.theme();

    let counts = format!(
        "{}/{} headlines",
        app.board.visible_count(),
        app.board.rows().len()
    );
    let freshness = match (app.loading, app.last_refresh) {
        (true, _) => format!("{} Loading...", app.get_spinner_char()),
        (false, Some((at, FetchOrigin::Cache))) => format!("cached {}", relative_time(at)),
        (false, Some((at, FetchOrigin::Network))) => format!("updated {}", relative_time(at)),
        (false, None) => String::new(),
    };
    let message = app
        .status
        .as_ref()
        .map(|s| format!(" | {}", s.text))
        .unwrap_or_default();

    let status = format!(
        " {} | {}{} | j/k: Nav | Tab/0-9: Filter | Enter: Open | r: Refresh | d: Theme | q: Quit",
        counts, freshness, message
    );

    let p = Paragraph::new(status)
        .style(Style::default().bg(theme.selection_bg).fg(theme.selection_fg));
    f.render_widget(p, area);
}
