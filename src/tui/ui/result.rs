//! Assessment progress and result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::application::{Assessment, AssessmentStage};
use crate::domain::{BmiStatus, BpStatus, PulsePressureStatus, RadarProfile};
use crate::tui::styles::MedicalTheme;

/// Result pane state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Worker running; last stage reported
    Running { stage: AssessmentStage },
    Complete { assessment: Box<Assessment> },
    Error { message: String },
}

impl ResultState {
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

fn stage_text(stage: AssessmentStage) -> (&'static str, f64) {
    match stage {
        AssessmentStage::Validating => ("Checking input ranges...", 0.1),
        AssessmentStage::LoadingModel => ("Loading classifier...", 0.3),
        AssessmentStage::Deriving => ("Deriving BMI and pulse pressure...", 0.6),
        AssessmentStage::Classifying => ("Evaluating risk model...", 0.85),
    }
}

/// Render the result pane
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    match state {
        ResultState::Idle => render_idle(f, area),
        ResultState::Running { stage } => render_progress(f, area, *stage),
        ResultState::Complete { assessment } => render_assessment(f, area, assessment),
        ResultState::Error { message } => render_error(f, area, message),
    }
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Fill in the health profile and press Enter",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press S to load default values",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title(Span::styled(" Result ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_progress(f: &mut Frame, area: Rect, stage: AssessmentStage) {
    let (description, ratio) = stage_text(stage);

    let block = Block::default()
        .title(Span::styled(" Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).border_style(MedicalTheme::border()))
        .gauge_style(MedicalTheme::info())
        .ratio(ratio);
    f.render_widget(gauge, chunks[0]);

    let desc = Paragraph::new(Span::styled(description, MedicalTheme::text_muted()))
        .alignment(Alignment::Center);
    f.render_widget(desc, chunks[1]);
}

fn render_assessment(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let tier = assessment.result.tier;

    let block = Block::default()
        .title(Span::styled(" Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::risk_text(tier));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Badge
            Constraint::Length(7), // Profile
            Constraint::Length(5), // Metrics
            Constraint::Min(0),
        ])
        .split(inner);

    let badge = Paragraph::new(vec![
        Line::from(Span::styled(
            format!(" {} ", tier.label().to_uppercase()),
            MedicalTheme::risk_tier(tier),
        )),
        Line::from(vec![
            Span::styled("Probability ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("{:.1}%", assessment.result.probability * 100.0),
                MedicalTheme::risk_text(tier),
            ),
            Span::styled("  Confidence ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("{}%", assessment.result.confidence_percent()),
                MedicalTheme::text(),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(tier.message(), MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(badge, chunks[0]);

    render_profile(f, chunks[1], &assessment.vitals.profile);
    render_metrics(f, chunks[2], assessment);
}

fn render_profile(f: &mut Frame, area: Rect, profile: &RadarProfile) {
    let block = Block::default()
        .title(Span::styled(" Health Profile ", MedicalTheme::text_secondary()))
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(profile.axes.iter().map(|_| Constraint::Length(1)))
        .split(inner);

    for (axis, row) in profile.axes.iter().zip(rows.iter()) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(13), Constraint::Min(0)])
            .split(*row);

        f.render_widget(
            Paragraph::new(Span::styled(axis.label, MedicalTheme::text_secondary())),
            cols[0],
        );
        let ratio = axis.value.clamp(0.0, 1.0);
        f.render_widget(
            Gauge::default()
                .gauge_style(MedicalTheme::indicator(ratio > 0.66))
                .ratio(ratio)
                .label(format!("{:.0}%", ratio * 100.0)),
            cols[1],
        );
    }
}

fn render_metrics(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let v = &assessment.vitals;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    metric_card(
        f,
        cols[0],
        "BMI",
        format!("{:.1}", v.bmi),
        v.bmi_status.to_string(),
        v.bmi_status == BmiStatus::Attention,
    );
    metric_card(
        f,
        cols[1],
        "Blood Pressure",
        format!("{}/{}", v.systolic, v.diastolic),
        v.bp_status.to_string(),
        v.bp_status == BpStatus::Elevated,
    );
    metric_card(
        f,
        cols[2],
        "Pulse Pressure",
        format!("{} mmHg", v.pulse_pressure),
        v.pulse_pressure_status.to_string(),
        v.pulse_pressure_status == PulsePressureStatus::Wide,
    );
}

fn metric_card(
    f: &mut Frame,
    area: Rect,
    title: &str,
    value: String,
    status: String,
    flagged: bool,
) {
    let content = Paragraph::new(vec![
        Line::from(Span::styled(value, MedicalTheme::title())),
        Line::from(Span::styled(status, MedicalTheme::indicator(flagged))),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title(Span::styled(format!(" {title} "), MedicalTheme::text_secondary()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(content, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Assessment failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(" Result ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}
