//! System Info and Disclaimer tabs.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::adapters::SignaturePolicy;
use crate::domain::FeatureRecord;
use crate::ports::ModelInfo;
use crate::tui::styles::MedicalTheme;

/// What the System Info tab shows.
#[derive(Debug, Clone)]
pub struct SystemInfoState {
    pub model: Option<ModelInfo>,
    pub policy: SignaturePolicy,
}

fn row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<14}"), MedicalTheme::text_secondary()),
        Span::styled(value, MedicalTheme::text()),
    ])
}

pub fn render_system_info(f: &mut Frame, area: Rect, state: &SystemInfoState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let model_lines = match &state.model {
        Some(m) => vec![
            row("Type", m.model_type.clone()),
            row("Estimators", m.n_estimators.to_string()),
            row("Features", m.feature_names.len().to_string()),
            row("Source", m.source.display().to_string()),
            row("SHA-256", m.sha256.chars().take(16).collect::<String>() + "…"),
            row(
                "Signature",
                if m.signed { "verified" } else { "unsigned" }.to_string(),
            ),
            row(
                "Policy",
                match state.policy {
                    SignaturePolicy::Required => "signature required",
                    SignaturePolicy::IfPresent => "verify if present",
                }
                .to_string(),
            ),
            row("Loaded", m.loaded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ],
        None => vec![Line::from(Span::styled(
            "No classifier loaded",
            MedicalTheme::warning(),
        ))],
    };

    let model = Paragraph::new(model_lines).block(
        Block::default()
            .title(Span::styled(" Model ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(model, chunks[0]);

    let mut pipeline = vec![
        Line::from(Span::styled("1. Validate input ranges", MedicalTheme::text())),
        Line::from(Span::styled(
            "2. BMI = weight / (height/100)²",
            MedicalTheme::text(),
        )),
        Line::from(Span::styled(
            "3. BMI category (18.5 / 25 / 30)",
            MedicalTheme::text(),
        )),
        Line::from(Span::styled(
            "4. Pulse pressure = systolic - diastolic",
            MedicalTheme::text(),
        )),
        Line::from(Span::styled(
            "5. Classify; tier from P(disease)",
            MedicalTheme::text(),
        )),
        Line::from(""),
        Line::from(Span::styled("Feature order", MedicalTheme::text_secondary())),
    ];
    pipeline.extend(
        FeatureRecord::FEATURE_NAMES
            .chunks(5)
            .map(|names| Line::from(Span::styled(names.join(", "), MedicalTheme::text_muted()))),
    );

    let p = Paragraph::new(pipeline).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(Span::styled(" Pipeline ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(p, chunks[1]);
}

pub fn render_disclaimer_tab(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled("Educational use only", MedicalTheme::title())),
        Line::from(""),
        Line::from(Span::styled(
            "CardioGuard estimates cardiovascular disease risk from a handful of routine \
             measurements using a statistical model trained on historical data.",
            MedicalTheme::text(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "The estimate is not a diagnosis and does not replace evaluation by a \
             qualified clinician. Do not start, stop or change any treatment based on it.",
            MedicalTheme::text(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Inputs are processed locally and are not stored.",
            MedicalTheme::text_secondary(),
        )),
    ];

    let p = Paragraph::new(text).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(Span::styled(" Disclaimer ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(p, area);
}
