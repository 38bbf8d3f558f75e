//! List the checklist

use std::path::Path;

use wiverify::output::{OutputMode, RuleListResult};

/// Print the rules that a run would evaluate
pub fn rules(config_path: Option<&Path>, only: &[String], mode: OutputMode) -> anyhow::Result<u8> {
    let (_, _, checklist) = super::checklist(config_path, only)?;
    RuleListResult::from_checklist(&checklist).render(mode);
    Ok(0)
}
