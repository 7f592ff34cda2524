use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        key_line("s", 11, "Start job on the current tab"),
        key_line("x", 11, "Cancel running job (progress is kept)"),
        key_line("f", 11, "Mark job as failed (also after a cancel)"),
        key_line("tab", 9, "Switch tabs"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Analysis tab:"),
        key_line("1-4", 9, "Toggle analysis options"),
        Line::from(""),
        Line::from("Compare tab:"),
        key_line("↑/↓", 9, "Select file"),
        key_line("d", 11, "Remove selected file"),
        Line::from(""),
        Line::from("History tab:"),
        key_line("/", 11, "Search by filename or id (Enter/Esc to finish)"),
        key_line("m", 11, "Cycle status filter"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
