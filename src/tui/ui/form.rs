//! Assessment input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    derive, BmiCategory, Gender, Level, RawAssessmentInput, AGE_RANGE, DIASTOLIC_RANGE,
    HEIGHT_RANGE, SYSTOLIC_RANGE, WEIGHT_RANGE,
};
use crate::tui::styles::MedicalTheme;

const AGE: usize = 0;
const GENDER: usize = 1;
const HEIGHT: usize = 2;
const WEIGHT: usize = 3;
const SYSTOLIC: usize = 4;
const DIASTOLIC: usize = 5;
const CHOLESTEROL: usize = 6;
const GLUCOSE: usize = 7;
const SMOKER: usize = 8;
const ALCOHOL: usize = 9;
const ACTIVE: usize = 10;

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub value: String,
    pub min: u16,
    pub max: u16,
}

impl FormField {
    fn new(label: &'static str, hint: &'static str, min: u16, max: u16) -> Self {
        Self {
            label,
            hint,
            value: String::new(),
            min,
            max,
        }
    }

    fn parse(&self) -> Result<u16, String> {
        let value: u16 = self
            .value
            .trim()
            .parse()
            .map_err(|_| format!("{}: Enter a whole number", self.label))?;
        if value < self.min || value > self.max {
            return Err(format!(
                "{}: Value must be between {} and {}",
                self.label, self.min, self.max
            ));
        }
        Ok(value)
    }
}

/// Assessment form state
pub struct AssessmentFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for AssessmentFormState {
    fn default() -> Self {
        Self {
            fields: vec![
                FormField::new("Age", "years (18-100)", *AGE_RANGE.start(), *AGE_RANGE.end()),
                FormField::new("Gender", "1=female, 2=male", 1, 2),
                FormField::new(
                    "Height",
                    "cm (120-220)",
                    *HEIGHT_RANGE.start(),
                    *HEIGHT_RANGE.end(),
                ),
                FormField::new(
                    "Weight",
                    "kg (30-200)",
                    *WEIGHT_RANGE.start(),
                    *WEIGHT_RANGE.end(),
                ),
                FormField::new(
                    "Systolic BP",
                    "mmHg (80-220)",
                    *SYSTOLIC_RANGE.start(),
                    *SYSTOLIC_RANGE.end(),
                ),
                FormField::new(
                    "Diastolic BP",
                    "mmHg (40-160)",
                    *DIASTOLIC_RANGE.start(),
                    *DIASTOLIC_RANGE.end(),
                ),
                FormField::new("Cholesterol", "1=normal, 2=above, 3=high", 1, 3),
                FormField::new("Glucose", "1=normal, 2=above, 3=high", 1, 3),
                FormField::new("Smoker", "0=no, 1=yes", 0, 1),
                FormField::new("Alcohol", "0=no, 1=yes", 0, 1),
                FormField::new("Physically Active", "0=no, 1=yes", 0, 1),
            ],
            selected_field: 0,
            error_message: None,
        }
    }
}

impl AssessmentFormState {
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Digits only; every field is a whole number.
    pub fn input_char(&mut self, c: char) {
        if c.is_ascii_digit() && self.fields[self.selected_field].value.len() < 3 {
            self.fields[self.selected_field].value.push(c);
            self.error_message = None;
        }
    }

    pub fn delete_char(&mut self) {
        self.fields[self.selected_field].value.pop();
    }

    pub fn clear_field(&mut self) {
        self.fields[self.selected_field].value.clear();
    }

    /// Wipe all field buffers once an assessment has been handed off.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Fill every field from the default input.
    pub fn load_defaults(&mut self) {
        self.fill(&RawAssessmentInput::default());
        self.error_message = None;
    }

    fn fill(&mut self, raw: &RawAssessmentInput) {
        let values = [
            raw.age_years,
            u16::from(raw.gender.code()),
            raw.height_cm,
            raw.weight_kg,
            raw.systolic_bp,
            raw.diastolic_bp,
            u16::from(raw.cholesterol.code()),
            u16::from(raw.glucose.code()),
            u16::from(raw.smoker),
            u16::from(raw.alcohol),
            u16::from(raw.active),
        ];
        for (field, value) in self.fields.iter_mut().zip(values) {
            field.value = value.to_string();
        }
    }

    /// Parse every field into an assessment input.
    ///
    /// # Errors
    /// Returns a message naming the first field that is empty, not a whole
    /// number or outside its range.
    pub fn to_input(&self) -> Result<RawAssessmentInput, String> {
        let v = |i: usize| self.fields[i].parse();
        let code = |i: usize| -> Result<u8, String> {
            v(i).and_then(|n| u8::try_from(n).map_err(|e| e.to_string()))
        };

        Ok(RawAssessmentInput {
            age_years: v(AGE)?,
            gender: Gender::try_from(code(GENDER)?)?,
            height_cm: v(HEIGHT)?,
            weight_kg: v(WEIGHT)?,
            systolic_bp: v(SYSTOLIC)?,
            diastolic_bp: v(DIASTOLIC)?,
            cholesterol: Level::try_from(code(CHOLESTEROL)?)?,
            glucose: Level::try_from(code(GLUCOSE)?)?,
            smoker: v(SMOKER)? == 1,
            alcohol: v(ALCOHOL)? == 1,
            active: v(ACTIVE)? == 1,
        })
    }

    /// BMI and its category from the current height and weight, when both
    /// parse and lie within range.
    #[must_use]
    pub fn bmi_preview(&self) -> Option<(f64, BmiCategory)> {
        let height_cm = self.fields[HEIGHT].parse().ok()?;
        let weight_kg = self.fields[WEIGHT].parse().ok()?;
        let record = derive(&RawAssessmentInput {
            height_cm,
            weight_kg,
            ..Default::default()
        });
        Some((record.bmi, record.bmi_cat))
    }
}

/// Render the assessment input form
pub fn render_assessment_form(f: &mut Frame, area: Rect, state: &AssessmentFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header + BMI preview
            Constraint::Min(0),    // Fields
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0], state);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect, state: &AssessmentFormState) {
    let preview = match state.bmi_preview() {
        Some((bmi, label)) => vec![
            Span::styled(" │ BMI ", MedicalTheme::text_secondary()),
            Span::styled(format!("{bmi:.1}"), MedicalTheme::title()),
            Span::styled(format!(" ({label})"), MedicalTheme::text_secondary()),
        ],
        None => vec![Span::styled(
            " │ BMI shown once height and weight are valid",
            MedicalTheme::text_muted(),
        )],
    };

    let mut spans = vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Health Profile", MedicalTheme::title()),
    ];
    spans.extend(preview);

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &AssessmentFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = state.fields.len().div_ceil(2);

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value_display = if field.value.is_empty() {
            Span::styled(field.hint, MedicalTheme::text_muted())
        } else {
            Span::styled(field.value.as_str(), MedicalTheme::text())
        };

        let cursor = if is_selected {
            Span::styled("▌", Style::default().fg(MedicalTheme::PRIMARY_LIGHT))
        } else {
            Span::raw("")
        };

        let content = Paragraph::new(Line::from(vec![Span::raw(" "), value_display, cursor]))
            .block(block);

        f.render_widget(content, chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &AssessmentFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Assess ", MedicalTheme::key_desc()),
            Span::styled("[S] ", MedicalTheme::key_hint()),
            Span::styled("Defaults ", MedicalTheme::key_desc()),
            Span::styled("[Del] ", MedicalTheme::key_hint()),
            Span::styled("Clear ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_to_input() {
        let mut form = AssessmentFormState::default();
        form.load_defaults();
        assert_eq!(
            form.to_input().expect("defaults parse"),
            RawAssessmentInput::default()
        );
    }

    #[test]
    fn test_empty_form_is_rejected() {
        let form = AssessmentFormState::default();
        let err = form.to_input().expect_err("empty");
        assert!(err.starts_with("Age"));
    }

    #[test]
    fn test_out_of_range_field_is_rejected() {
        let mut form = AssessmentFormState::default();
        form.load_defaults();
        form.fields[HEIGHT].value = "250".into();
        let err = form.to_input().expect_err("too tall");
        assert_eq!(err, "Height: Value must be between 120 and 220");
    }

    #[test]
    fn test_input_accepts_digits_only() {
        let mut form = AssessmentFormState::default();
        for c in "4a5.x".chars() {
            form.input_char(c);
        }
        assert_eq!(form.fields[AGE].value, "45");
    }

    #[test]
    fn test_bmi_preview() {
        let mut form = AssessmentFormState::default();
        assert!(form.bmi_preview().is_none());

        form.load_defaults();
        let (bmi, cat) = form.bmi_preview().expect("preview");
        assert!((bmi - 25.71).abs() < 0.01);
        assert_eq!(cat, BmiCategory::Overweight);

        form.fields[WEIGHT].value = "10".into();
        assert!(form.bmi_preview().is_none());
    }

    #[test]
    fn test_navigation_wraps() {
        let mut form = AssessmentFormState::default();
        form.prev_field();
        assert_eq!(form.selected_field, ACTIVE);
        form.next_field();
        assert_eq!(form.selected_field, AGE);
    }

    #[test]
    fn test_clear_sensitive() {
        let mut form = AssessmentFormState::default();
        form.load_defaults();
        form.selected_field = 4;
        form.clear_sensitive();
        assert!(form.fields.iter().all(|f| f.value.is_empty()));
        assert_eq!(form.selected_field, 0);
    }
}
