//! TUI module: Terminal User Interface using Ratatui.
//!
//! Three tabs:
//! - Risk assessment form with live BMI preview and result panel
//! - System info for the loaded classifier
//! - Disclaimer

mod app;
mod styles;
mod ui;
mod worker;

pub use app::{App, Tab};
pub use styles::MedicalTheme;
pub use worker::{AssessmentProgress, AssessmentWorker, AssessmentWorkerHandle};
