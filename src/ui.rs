use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::app::{App, InputMode};
use crate::model::ResourceKind;
use crate::render::event_badge_class;

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_tabs(frame, root[1], app);
    app.set_table_page_size(root[2].height.saturating_sub(3) as usize);
    render_panel(frame, root[2], app);
    render_footer(frame, root[3], app);

    if app.show_help() {
        render_help_modal(frame);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let last_refresh = app
        .table_for(app.active_tab())
        .and_then(|table| table.last_refreshed)
        .map(|ts| ts.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    let line = Line::from(vec![
        Span::styled(
            " BELUGA ",
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", app.backend_url()), Style::default().fg(MUTED)),
        Span::styled(
            format!(" refresh {}s ", app.refresh_secs()),
            Style::default().fg(MUTED),
        ),
        Span::styled(
            format!(" updated {last_refresh} "),
            Style::default().fg(MUTED),
        ),
    ]);
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(BG)), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    for (index, kind) in app.tabs().iter().enumerate() {
        let active = *kind == app.active_tab();
        let label = format!(" {} {} ", index + 1, kind.title());
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED).bg(PANEL)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::styled(" ", Style::default().bg(BG)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn render_panel(frame: &mut Frame, area: Rect, app: &App) {
    let kind = app.active_tab();
    let Some(table) = app.table_for(kind) else {
        return;
    };

    // The three regions are mutually exclusive: loading while a cycle is
    // in flight, the error banner after a failure, the table otherwise.
    if table.loading {
        render_loading(frame, area, kind);
        return;
    }
    if let Some(error) = &table.error {
        render_error(frame, area, kind, error);
        return;
    }

    render_table(frame, area, app, kind);
}

fn render_loading(frame: &mut Frame, area: Rect, kind: ResourceKind) {
    let panel = Paragraph::new(Text::from(format!("Loading {}…", kind.plural())))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(kind.title())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(MUTED));
    frame.render_widget(panel, area);
}

fn render_error(frame: &mut Frame, area: Rect, kind: ResourceKind, error: &str) {
    let panel = Paragraph::new(Text::from(error.to_string()))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!("{} Error", kind.title()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ERROR))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(ERROR));
    frame.render_widget(panel, area);
}

fn render_table(frame: &mut Frame, area: Rect, app: &App, kind: ResourceKind) {
    let headers = app.active_headers();
    let visible_rows = app.active_visible_rows();

    let block = Block::default()
        .title(format!("{} — {}", kind.title(), app.active_count_label()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));

    if visible_rows.is_empty() {
        let message = if app.active_filter().is_empty() {
            format!("No {} found", kind.plural())
        } else {
            format!("No {} match '{}'", kind.plural(), app.active_filter())
        };
        let panel = Paragraph::new(Text::from(message))
            .alignment(Alignment::Center)
            .block(block)
            .style(Style::default().fg(MUTED));
        frame.render_widget(panel, area);
        return;
    }

    let header_row = Row::new(headers.iter().map(|header| {
        Cell::from(header.clone()).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let rows = visible_rows.iter().map(|row| {
        Row::new(row.columns.iter().enumerate().map(|(index, column)| {
            let style = if kind == ResourceKind::Events
                && index == 0
                && event_badge_class(column) == "badge-warning"
            {
                Style::default().fg(WARN).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Cell::from(column.clone()).style(style)
        }))
    });

    let constraints = column_constraints(headers.len().max(1));
    let table_widget = Table::new(rows, constraints)
        .header(header_row)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(30, 58, 90))
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    state.select(app.active_selected_index());
    frame.render_stateful_widget(table_widget, area, &mut state);
}

fn column_constraints(count: usize) -> Vec<Constraint> {
    let share = (100 / count as u16).max(1);
    (0..count).map(|_| Constraint::Percentage(share)).collect()
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = match app.mode() {
        InputMode::Filter => Line::from(vec![
            Span::styled(" / ", Style::default().fg(Color::Black).bg(WARN)),
            Span::styled(
                format!("{}▌", app.input()),
                Style::default().fg(Color::White),
            ),
        ]),
        InputMode::Normal => {
            let mut spans = vec![Span::styled(
                format!(" {} ", app.status()),
                Style::default().fg(Color::White),
            )];
            if !app.active_filter().is_empty() {
                spans.push(Span::styled(
                    format!(" filter: {} ", app.active_filter()),
                    Style::default().fg(WARN),
                ));
            }
            spans.push(Span::styled(
                " q quit · / filter · r refresh · x export · ? help ",
                Style::default().fg(MUTED),
            ));
            Line::from(spans)
        }
    };
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(BG)), area);
}

fn render_help_modal(frame: &mut Frame) {
    let area = centered_rect(52, 14, frame.area());
    let lines = vec![
        Line::from(Span::styled(
            "Keys",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from("  1/2/3, Tab, ←/→   switch tab"),
        Line::from("  j/k, ↓/↑          move selection"),
        Line::from("  gg / G            top / bottom"),
        Line::from("  /                 filter current tab"),
        Line::from("  Esc               clear filter / close"),
        Line::from("  r, F5             refresh now"),
        Line::from("  x                 export HTML report"),
        Line::from("  q                 quit"),
    ];
    let panel = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT))
            .style(Style::default().bg(PANEL)),
    );
    frame.render_widget(Clear, area);
    frame.render_widget(panel, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
