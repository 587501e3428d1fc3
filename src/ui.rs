//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is one card per category stacked vertically, with a one-line
//!   status bar at the bottom.
//! * [`item_lines`] is the only place that knows how each [`ContentItem`]
//!   variant is displayed.

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::source::{Category, ContentItem};

/// Draw the complete UI for one frame.
pub fn draw(app: &App, frame: &mut Frame) {
    let [cards_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    let card_areas = Layout::vertical(
        Category::ALL.map(|_| Constraint::Ratio(1, Category::ALL.len() as u32)),
    )
    .split(cards_area);

    for (category, area) in Category::ALL.iter().zip(card_areas.iter()) {
        draw_card(app, *category, frame, *area);
    }
    draw_status_bar(app, frame, status_area);
}

/// Render a single category card.
fn draw_card(app: &App, category: Category, frame: &mut Frame, area: Rect) {
    let lines = app.shown.get(category).map(item_lines).unwrap_or_default();
    let card = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(format!(" {} ", category.title()))
                .borders(Borders::ALL),
        );
    frame.render_widget(card, area);
}

fn item_lines(item: &ContentItem) -> Vec<Line<'_>> {
    let muted = Style::default().fg(Color::DarkGray);
    let strong = Style::default().add_modifier(Modifier::BOLD);
    match item {
        ContentItem::Quote { text, author } => vec![
            Line::from(format!("\u{201c}{text}\u{201d}")),
            Line::from(Span::styled(format!("  \u{2014} {author}"), muted)),
        ],
        ContentItem::Joke { setup, punchline } => {
            let mut lines = vec![Line::from(setup.as_str())];
            if let Some(punchline) = punchline {
                lines.push(Line::from(Span::styled(
                    punchline.as_str(),
                    Style::default().fg(Color::Yellow),
                )));
            }
            lines
        }
        ContentItem::Trivia { text } => vec![Line::from(text.as_str())],
        ContentItem::HistoryFact { year, text } => vec![Line::from(vec![
            Span::styled(format!("{year}: "), strong.fg(Color::Cyan)),
            Span::raw(text.as_str()),
        ])],
        ContentItem::WordEntry {
            word,
            part_of_speech,
            definition,
        } => vec![
            Line::from(vec![
                Span::styled(word.as_str(), strong),
                Span::styled(format!(" ({part_of_speech})"), muted),
            ]),
            Line::from(definition.as_str()),
        ],
    }
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let source_status = app.source_status();
    let source_color = if source_status == "all live" {
        Color::Green
    } else {
        Color::Magenta
    };
    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(app.status(Utc::now()), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(source_status, Style::default().fg(source_color)),
        Span::raw("  q: quit  n: next"),
    ]));
    frame.render_widget(status, area);
}
