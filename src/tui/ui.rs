use crate::tui::app::App;
use crate::tui::session::SearchMode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Index size and mode
            Constraint::Length(3), // Query input
            Constraint::Min(10),   // Results / details
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_query_input(f, app, chunks[1]);
    draw_main_area(f, app, chunks[2]);
    draw_status_bar(f, app, chunks[3]);
}

fn mode_span(mode: SearchMode, active: SearchMode) -> Span<'static> {
    let style = if mode == active {
        Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!(" {} ", mode.label()), style)
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let mode = app.mode();
    let line = Line::from(vec![
        Span::raw(format!("Index: {} elements  ", app.element_count())),
        mode_span(SearchMode::Normal, mode),
        Span::raw(" "),
        mode_span(SearchMode::Ai, mode),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_query_input(f: &mut Frame, app: &App, area: Rect) {
    let query = app.session.input();
    let input = Paragraph::new(query)
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search (Tab: mode, Up/Down: select, Enter: open, Esc: quit) "),
        );

    f.render_widget(input, area);

    let width = query.chars().count() as u16;
    f.set_cursor_position((area.x + width + 1, area.y + 1));
}

fn draw_main_area(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_results_list(f, app, chunks[0]);
    draw_details(f, app, chunks[1]);
}

fn draw_results_list(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .results()
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let style = if i == app.selected {
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let element = &result.element;
            let line = Line::from(vec![
                Span::styled(format!("{:2}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{} ", element.kind.icon()),
                    Style::default().fg(Color::Magenta),
                ),
                Span::styled(element.qualified_name(), Style::default().fg(Color::White)),
                Span::styled(
                    format!(" ({:.3})", result.score),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);

            ListItem::new(line).style(style)
        })
        .collect();

    let title = if app.is_loading() {
        " Results (searching...) ".to_string()
    } else {
        format!(" Results ({}) ", app.results().len())
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn draw_details(f: &mut Frame, app: &App, area: Rect) {
    let Some(result) = app.selected_result() else {
        let empty = Paragraph::new("No selection")
            .block(Block::default().borders(Borders::ALL).title(" Details "));
        f.render_widget(empty, area);
        return;
    };

    let element = &result.element;
    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Path: ", label),
            Span::styled(
                element.file_path.display().to_string(),
                Style::default().fg(Color::Blue),
            ),
        ]),
        Line::from(vec![
            Span::styled("Line: ", label),
            Span::styled(element.line_number.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![Span::styled("Type: ", label), Span::raw(element.kind.as_str())]),
        Line::from(Span::raw(element.description.as_str())),
        Line::default(),
    ];

    for (line_num, text) in app.preview_lines() {
        let is_match = line_num == element.line_number;
        let content_style = if is_match {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:4} ", line_num), label),
            Span::styled(text, content_style),
        ]));
    }

    let details = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", element.file_name())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(details, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let status = Paragraph::new(app.status_message.as_str()).style(Style::default().fg(Color::Cyan));
    f.render_widget(status, area);
}
