//! Correction detection command
//!
//! Always prints a report. Problems, including an unreadable `--since`
//! value or config file, are listed in the report's errors instead of
//! failing the process, so the session hooks that call this never see a
//! non-zero exit.

use anyhow::Result;
use lattice_core::{
    utils::time::parse_instant, CorrectionEngine, DetectionReport, LatticeConfig, RunOptions,
};
use tracing::{debug, warn};

/// Parsed `detect` flags
#[derive(Debug, Clone, Default)]
pub struct DetectArgs {
    pub since: Option<String>,
    pub session: Option<String>,
    pub dry_run: bool,
    pub verbose: bool,
    pub json: bool,
    pub no_instincts: bool,
}

/// Handle detect command
///
/// A config that failed to load is replaced by the environment defaults.
pub fn handle(config: Result<LatticeConfig>, args: DetectArgs) -> Result<()> {
    let report = build_report(config, &args);

    if args.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

fn build_report(config: Result<LatticeConfig>, args: &DetectArgs) -> DetectionReport {
    match config {
        Ok(config) => run(config, args),
        Err(e) => {
            warn!("Falling back to default config: {:#}", e);
            let mut report = run(LatticeConfig::from_env(), args);
            report.errors.insert(0, format!("config: {:#}", e));
            report
        }
    }
}

fn run(config: LatticeConfig, args: &DetectArgs) -> DetectionReport {
    let since = match args.since.as_deref().map(parse_instant).transpose() {
        Ok(since) => since,
        Err(e) => {
            warn!("Invalid --since value: {}", e);
            let mut report = DetectionReport::no_observations(args.dry_run, args.session.clone());
            report.errors.push(format!("--since: {}", e));
            return report;
        }
    };

    let options = RunOptions {
        since,
        session_id: args.session.clone(),
        dry_run: args.dry_run,
        verbose: args.verbose,
        create_instincts: !args.no_instincts,
    };
    debug!("Running correction detection: {:?}", options);

    CorrectionEngine::new(config).run(&options)
}
