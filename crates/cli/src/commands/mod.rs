pub mod build;
pub mod catalog;
pub mod config;
pub mod expiration;

use std::path::PathBuf;

use cotiza_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use cotiza_core::{ApplicationError, InterfaceError};
use cotiza_store::FixtureData;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps an application failure onto the interface taxonomy.
    pub fn from_application_error(
        command: &str,
        correlation_id: &str,
        error: ApplicationError,
    ) -> Self {
        warn!(
            event_name = "cli.command.failed",
            command,
            correlation_id,
            user_correctable = error.is_user_correctable(),
            error = %error,
            "command failed"
        );
        match error.into_interface(correlation_id) {
            InterfaceError::BadRequest { message, .. } => {
                Self::failure(command, "bad_request", message, 5)
            }
            InterfaceError::ServiceUnavailable { message, .. } => {
                Self::failure(command, "service_unavailable", message, 6)
            }
            InterfaceError::Internal { message, .. } => {
                Self::failure(command, "internal", message, 7)
            }
        }
    }
}

/// Loads config, letting `fixture` override `data.fixture_path`, then the
/// dataset it points at. Without a configured path the built-in demo is used.
pub(crate) fn load_dataset(
    command: &str,
    fixture: Option<PathBuf>,
) -> Result<(AppConfig, FixtureData), CommandResult> {
    let options = LoadOptions {
        overrides: ConfigOverrides { fixture_path: fixture, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    };
    let config = AppConfig::load(options).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("config validation failed: {error}"),
            2,
        )
    })?;

    let data = match config.data.fixture_path.as_deref() {
        Some(path) => FixtureData::load(path)
            .map_err(|error| CommandResult::failure(command, "fixture", error.to_string(), 3))?,
        None => FixtureData::demo(),
    };
    info!(
        event_name = "cli.dataset.loaded",
        product_count = data.products.len(),
        client_count = data.clients.len(),
        "fixture dataset loaded"
    );

    Ok((config, data))
}

pub(crate) fn render_report(command: &str, report: &impl Serialize) -> CommandResult {
    match serde_json::to_string(report) {
        Ok(message) => CommandResult::success(command, message),
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        let message = error.to_string().replace('\\', "\\\\").replace('"', "\\\"");
        format!(
            concat!(
                "{{\"command\":\"unknown\",\"status\":\"error\",",
                "\"error_class\":\"serialization\",\"message\":\"{}\"}}"
            ),
            message
        )
    })
}
