//! Run the checklist against live systems

use std::path::Path;
use std::time::Instant;

use wiverify::adapters::{AzCli, Kubectl, ReqwestProbe, SystemRunner};
use wiverify::core::services::Engine;
use wiverify::output::{OutputMode, RunReport};

/// Verify the workload identity setup, returning the exit code
pub fn verify(config_path: Option<&Path>, only: &[String], mode: OutputMode) -> anyhow::Result<u8> {
    let (config, source, checklist) = super::checklist(config_path, only)?;

    let runner = SystemRunner::new(config.timeout());
    let cloud = AzCli::new(runner).with_subscription(config.cloud.subscription.clone());
    let cluster = Kubectl::new(runner).with_context(config.cluster.context.clone());
    let probe = ReqwestProbe::new(config.timeout())?;

    log::debug!(
        "running {} rules (timeout {}s, query errors: {})",
        checklist.len(),
        config.engine.timeout_secs,
        config.engine.query_errors
    );

    let started_at = chrono::Utc::now();
    let clock = Instant::now();
    let summary = Engine::new(&cloud, &cluster, &probe)
        .with_policy(config.engine.query_errors)
        .run(&checklist);

    let report = RunReport {
        version: wiverify::VERSION.to_string(),
        started_at: started_at.to_rfc3339(),
        duration_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
        config: source.map(|p| p.display().to_string()),
        summary,
    };
    report.render(mode);

    Ok(report.summary.exit_code())
}
