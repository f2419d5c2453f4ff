//! UI module: View components for the TUI.

pub mod form;
pub mod info;
pub mod result;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::tui::styles::{MedicalTheme, LOGO_SMALL};

pub const TAB_TITLES: [&str; 3] = ["Risk Assessment", "System Info", "Disclaimer"];

pub fn render_tabs(f: &mut Frame, area: Rect, selected: usize) {
    let titles = TAB_TITLES
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!(" F{} {t} ", i + 1)));

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(MedicalTheme::text_secondary())
        .highlight_style(MedicalTheme::selected())
        .divider("│")
        .block(
            Block::default()
                .title(Span::styled(format!(" {LOGO_SMALL} "), MedicalTheme::header()))
                .borders(Borders::BOTTOM)
                .border_style(MedicalTheme::border()),
        );

    f.render_widget(tabs, area);
}

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![Line::from(vec![Span::styled(
        "DISCLAIMER: Indicative estimate for educational use. Not a substitute for professional medical evaluation.",
        MedicalTheme::text_muted(),
    )])];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
