//! TUI rendering.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Tabs},
};

use super::app::{App, CrackField, CrackPanel, Tab};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    match app.tab {
        Tab::Wifi => draw_wifi(f, app, chunks[1]),
        Tab::Bluetooth => draw_bluetooth(f, app, chunks[1]),
        Tab::Radio => draw_radio(f, app, chunks[1]),
    }
    draw_footer(f, app, chunks[2]);

    if let Some(ref panel) = app.crack {
        draw_crack_panel(f, panel, chunks[1]);
    }
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
}

fn header_row(labels: &[&'static str]) -> Row<'static> {
    let cells = labels
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).bold()));
    Row::new(cells).height(1).bottom_margin(1)
}

fn row_style(selected: bool) -> Style {
    if selected {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default()
    }
}

fn signal_color(dbm: i32) -> Color {
    match dbm {
        s if s >= -60 => Color::Green,
        s if s >= -75 => Color::Yellow,
        _ => Color::Red,
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = Tab::ALL
        .iter()
        .map(|tab| {
            let count = match tab {
                Tab::Wifi => app.access_points.len(),
                Tab::Bluetooth => app.devices.len(),
                Tab::Radio => app.events.len(),
            };
            format!("{} ({})", tab.title(), count)
        })
        .collect();
    let selected = Tab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);

    let updated = app
        .last_update
        .map(|t| format!(" Airspy | updated {} ", t.format("%H:%M:%S")))
        .unwrap_or_else(|| " Airspy | waiting for first scan ".to_string());

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Cyan).bold())
        .block(bordered(&updated));

    f.render_widget(tabs, area);
}

fn draw_wifi(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let rows = app.access_points.iter().enumerate().map(|(i, ap)| {
        let cells = vec![
            Cell::from(truncate(ap.display_name(), 24)),
            Cell::from(ap.bssid.clone()),
            Cell::from(ap.channel.to_string()),
            Cell::from(ap.signal.to_string()).style(Style::default().fg(signal_color(ap.signal))),
            Cell::from(truncate(&ap.security, 18)),
            Cell::from(ap.clients.len().to_string()),
        ];
        Row::new(cells).style(row_style(i == app.selected()))
    });

    let widths = [
        Constraint::Length(24),
        Constraint::Length(18),
        Constraint::Length(4),
        Constraint::Length(6),
        Constraint::Length(18),
        Constraint::Length(3),
    ];

    let table = Table::new(rows, widths)
        .header(header_row(&["SSID", "BSSID", "CH", "dBm", "SECURITY", "CL"]))
        .block(bordered(" Networks "))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD));

    let mut state = TableState::default();
    state.select(Some(app.selected()));
    f.render_stateful_widget(table, columns[0], &mut state);

    draw_clients(f, app, columns[1]);
}

fn draw_clients(f: &mut Frame, app: &App, area: Rect) {
    let Some(ap) = app.selected_access_point() else {
        f.render_widget(Paragraph::new("No network selected").block(bordered(" Clients ")), area);
        return;
    };

    let title = format!(" Clients of {} ", truncate(ap.display_name(), 20));
    if ap.clients.is_empty() {
        let text = Paragraph::new("No connected clients seen")
            .style(Style::default().fg(Color::DarkGray))
            .block(bordered(&title));
        f.render_widget(text, area);
        return;
    }

    let items: Vec<ListItem> = ap
        .clients
        .iter()
        .map(|client| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{}  ", client.mac)),
                Span::styled(
                    format!("{} dBm", client.signal),
                    Style::default().fg(signal_color(client.signal)),
                ),
            ]))
        })
        .collect();
    f.render_widget(List::new(items).block(bordered(&title)), area);
}

fn draw_bluetooth(f: &mut Frame, app: &App, area: Rect) {
    let rows = app.devices.iter().enumerate().map(|(i, device)| {
        let name_style = if device.has_name() {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let cells = vec![
            Cell::from(device.address.clone()),
            Cell::from(truncate(&device.name, 32)).style(name_style),
            Cell::from(device.rssi.to_string()).style(Style::default().fg(signal_color(device.rssi))),
        ];
        Row::new(cells).style(row_style(i == app.selected()))
    });

    let widths = [Constraint::Length(18), Constraint::Length(32), Constraint::Length(6)];
    let table = Table::new(rows, widths)
        .header(header_row(&["ADDRESS", "NAME", "RSSI"]))
        .block(bordered(" Bluetooth Devices "))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD));

    let mut state = TableState::default();
    state.select(Some(app.selected()));
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_radio(f: &mut Frame, app: &App, area: Rect) {
    let rows = app.events.iter().enumerate().map(|(i, event)| {
        let cells = vec![
            Cell::from(truncate(event.model(), 24)).style(Style::default().fg(Color::Green)),
            Cell::from(event.summary()),
        ];
        Row::new(cells).style(row_style(i == app.selected()))
    });

    let widths = [Constraint::Length(24), Constraint::Min(20)];
    let table = Table::new(rows, widths)
        .header(header_row(&["MODEL", "DETAILS"]))
        .block(bordered(" RF Events "))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD));

    let mut state = TableState::default();
    state.select(Some(app.selected()));
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_crack_panel(f: &mut Frame, panel: &CrackPanel, area: Rect) {
    let popup = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area)[1];
    f.render_widget(Clear, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Capture
            Constraint::Length(3), // Wordlist
            Constraint::Min(0),    // Output
        ])
        .split(popup);

    let input = |label: &'static str, value: &str, focused: bool| {
        let style = if focused && !panel.is_running() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let cursor = if focused && !panel.is_running() { "_" } else { "" };
        Paragraph::new(format!("{}{}", value, cursor)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style)
                .title(label),
        )
    };
    f.render_widget(
        input(" Capture (.cap) ", &panel.capture, panel.focus == CrackField::Capture),
        chunks[0],
    );
    f.render_widget(
        input(" Dictionary ", &panel.wordlist, panel.focus == CrackField::Wordlist),
        chunks[1],
    );

    let visible = chunks[2].height.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = panel
        .output
        .iter()
        .skip(panel.output.len().saturating_sub(visible))
        .map(|l| Line::from(l.as_str()))
        .collect();
    if let Some(ref result) = panel.result {
        let color = if result.starts_with("KEY FOUND") {
            Color::Green
        } else {
            Color::Red
        };
        lines.push(Line::styled(result.clone(), Style::default().fg(color).bold()));
    }
    let title = if panel.is_running() {
        " Brute Force (running) "
    } else {
        " Brute Force "
    };
    f.render_widget(Paragraph::new(lines).block(bordered(title)), chunks[2]);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let status = app.status.as_deref().unwrap_or("");

    let help = match app.crack {
        Some(ref panel) if panel.is_running() => "Esc: stop",
        Some(_) => "Type path | Tab: switch field | Enter: start | Esc: close",
        None => "j/k: navigate | Tab/1-3: switch view | c: brute force | q: quit",
    };

    let footer_text = if status.is_empty() {
        help.to_string()
    } else {
        format!("{} | {}", status, help)
    };

    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(Color::DarkGray))
        .block(bordered(""));

    f.render_widget(footer, area);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max - 1).collect();
        format!("{}…", kept)
    }
}
