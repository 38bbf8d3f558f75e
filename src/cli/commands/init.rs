//! Write a sample configuration

use std::path::Path;

use wiverify::config::{Config, LOCAL_CONFIG};
use wiverify::output::{OperationResult, OutputMode};

/// Write `wiverify.toml` with the default identifiers
pub fn init(force: bool, mode: OutputMode) -> anyhow::Result<u8> {
    let path = Path::new(LOCAL_CONFIG);

    if path.exists() && !force {
        OperationResult {
            success: false,
            message: format!("{LOCAL_CONFIG} already exists. Use --force to overwrite."),
        }
        .render(mode);
        return Ok(1);
    }

    let header = "# wiverify configuration\n\
                  # Identifiers can be overridden with WIVERIFY_* environment variables,\n\
                  # e.g. WIVERIFY_RESOURCE_GROUP or WIVERIFY_NAMESPACE.\n\n";
    std::fs::write(path, format!("{header}{}", Config::default().to_toml()?))?;

    OperationResult {
        success: true,
        message: format!("Created {LOCAL_CONFIG}. Edit the identifiers, then run: wiverify verify"),
    }
    .render(mode);
    Ok(0)
}
