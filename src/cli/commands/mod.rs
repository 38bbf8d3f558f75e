//! Command implementations

mod init;
mod rules;
mod verify;

pub use init::init;
pub use rules::rules;
pub use verify::verify;

use std::path::Path;

use wiverify::config::Config;
use wiverify::core::models::Checklist;
use wiverify::core::services::workload_identity;

/// Load config and build the (optionally narrowed) checklist
fn checklist(
    config_path: Option<&Path>,
    only: &[String],
) -> anyhow::Result<(Config, Option<std::path::PathBuf>, Checklist)> {
    let (config, source) = Config::load(config_path)?;
    let checklist = Checklist::new(workload_identity::rules(&config.identifiers))?.select(only)?;
    Ok((config, source, checklist))
}
