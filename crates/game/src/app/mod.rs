mod bootstrap;
mod loop_runner;
mod sandbox;

use std::process::ExitCode;

pub(crate) use bootstrap::AppWiring;
pub(crate) use loop_runner::run;

/// Builds the app, logging any startup failure before handing back an exit
/// code for it.
pub(crate) fn build_app() -> Result<AppWiring, ExitCode> {
    bootstrap::build_app().map_err(|error| {
        tracing::error!(error = %error, "startup_failed");
        ExitCode::FAILURE
    })
}
