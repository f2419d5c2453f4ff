//! CardioGuard: cardiovascular risk assessment
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardioguard::config::Settings;
use cardioguard::tui::App;

fn main() -> Result<()> {
    let settings = Settings::from_env()?;

    // Writing logs to the terminal would corrupt the TUI (alternate screen).
    // Interactive sessions log to a file unless told otherwise.
    let use_file = settings.log_mode.use_file(std::io::stdout().is_terminal());

    let (writer, _guard) = if use_file {
        if let Some(parent) = settings.log_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(!use_file))
        .init();

    tracing::info!(
        "Starting CardioGuard (model path {:?}, signature policy {:?})",
        settings.model_path,
        settings.signature_policy()
    );

    let mut app = App::new(&settings)?;
    app.run()?;

    tracing::info!("CardioGuard shutdown complete.");
    Ok(())
}
