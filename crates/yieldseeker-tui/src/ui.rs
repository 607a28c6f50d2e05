use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use yieldseeker_core::View;

use crate::app::{App, EntryField, InputMode};

/// Turn `**bold**` runs into bold spans; everything else is literal.
fn parse_bold_line(text: &str) -> Line<'static> {
    // An unmatched marker is shown verbatim
    if text.matches("**").count() % 2 == 1 {
        return Line::from(text.to_string());
    }

    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, part) in text.split("**").enumerate() {
        if part.is_empty() {
            continue;
        }
        // Odd segments sit between a pair of markers
        if i % 2 == 1 {
            spans.push(Span::styled(
                part.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(part.to_string()));
        }
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.view {
        View::Entry => render_entry_view(app, frame, body_area),
        View::Chat => render_chat_view(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let signals = app.auth.current();
    let wallet = match (&signals.account, signals.chain_id) {
        (Some(account), Some(chain)) => format!(" [{} @ {}]", short_address(account), chain),
        (Some(account), None) => format!(" [{}]", short_address(account)),
        _ => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" Yield Seeker ", Style::default().fg(Color::Green).bold()),
        Span::styled(wallet, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// Column for a cursor `chars` into a bordered single-line input, kept inside the box.
fn cursor_x(area: Rect, chars: usize) -> u16 {
    let offset = u16::try_from(chars).unwrap_or(u16::MAX);
    area.x
        .saturating_add(1)
        .saturating_add(offset)
        .min(area.right().saturating_sub(2))
}

fn short_address(account: &str) -> String {
    if account.is_ascii() && account.len() > 10 {
        format!("{}…{}", &account[..6], &account[account.len() - 4..])
    } else {
        account.to_string()
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.view {
        View::Entry => " CONNECT ",
        View::Chat => " CHAT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: &[(&str, &str)] = match (app.view, app.input_mode) {
        (View::Entry, InputMode::Editing) => &[
            (" Tab ", " next field "),
            (" Enter ", " connect / sign in "),
            (" Esc ", " stop typing "),
        ],
        (View::Entry, InputMode::Normal) => &[
            (" j/k ", " field "),
            (" i ", " edit "),
            (" ^D ", " disconnect "),
            (" q ", " quit "),
        ],
        (View::Chat, InputMode::Editing) => &[
            (" Enter ", " send "),
            (" Esc ", " stop typing "),
            (" ^L ", " log out "),
        ],
        (View::Chat, InputMode::Normal) => &[
            (" j/k ", " scroll "),
            (" i ", " type "),
            (" ^L ", " log out "),
            (" ^D ", " disconnect "),
            (" q ", " quit "),
        ],
    };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    for (key, label) in keys {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_entry_view(app: &App, frame: &mut Frame, area: Rect) {
    let [title_area, form_area, message_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(9),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let title = Paragraph::new(Line::from(Span::styled(
        "Welcome to Yield Seeker",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )))
    .centered()
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(title, title_area);

    let [address_area, chain_area, signature_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(form_area);

    render_field(app, frame, address_area, EntryField::Address, " Wallet address ", &app.address_input);
    render_field(app, frame, chain_area, EntryField::ChainId, " Chain id ", &app.chain_input);
    render_field(app, frame, signature_area, EntryField::Signature, " Signature ", &app.signature_input);

    let message_text = match &app.login_message {
        Some(message) => Text::from(message.as_str()),
        None => Text::from(Span::styled(
            "Connect a wallet to get a login message to sign.",
            Style::default().fg(Color::DarkGray),
        )),
    };
    let message = Paragraph::new(message_text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Message to sign "),
        );
    frame.render_widget(message, message_area);

    let status = Paragraph::new(app.status.as_deref().unwrap_or(""))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(" Status "));
    frame.render_widget(status, status_area);
}

fn render_field(app: &App, frame: &mut Frame, area: Rect, field: EntryField, title: &str, value: &str) {
    let focused = app.entry_field == field;
    let border_color = match (focused, app.input_mode) {
        (true, InputMode::Editing) => Color::Yellow,
        (true, InputMode::Normal) => Color::Cyan,
        _ => Color::DarkGray,
    };

    let input = Paragraph::new(value).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );
    frame.render_widget(input, area);

    if focused && app.input_mode == InputMode::Editing {
        frame.set_cursor_position((cursor_x(area, value.chars().count()), area.y + 1));
    }
}

fn render_chat_view(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Inner size minus borders, for scroll calculations
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Yield Seeker Agent ");

    let messages = app.chat.messages();
    let chat_text = if messages.is_empty() && !app.chat.is_loading() {
        Text::from(Span::styled(
            "Ask about the best yield for your assets...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in messages {
            if msg.is_user {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(msg.content.as_str()));
            } else {
                lines.push(Line::from(Span::styled(
                    "Agent:",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(parse_bold_line(line));
                }
            }
            lines.push(Line::default());
        }

        if app.chat.is_loading() {
            lines.push(Line::from(Span::styled(
                "Agent:",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    let editing = app.input_mode == InputMode::Editing && !app.chat.is_loading();
    let input_color = if app.chat.is_loading() {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Cyan
    };
    let input = Paragraph::new(app.chat.input()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(input_color))
            .title(" Ask Yield Seeker... "),
    );
    frame.render_widget(input, input_area);

    if editing {
        frame.set_cursor_position((cursor_x(input_area, app.chat_cursor), input_area.y + 1));
    }
}
