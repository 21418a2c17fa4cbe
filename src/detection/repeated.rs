//! Repeated-command detection
//!
//! Counts completed shell executions per normalized command across the whole
//! window. Unlike the pairwise patterns this is not bounded by lookahead.

use super::normalize::normalize_command;
use crate::config::DetectionConfig;
use crate::types::{
    CommandExecution, Correction, CorrectionSignal, Observation, RepeatedCommandContext,
};
use std::collections::HashMap;

/// Find commands executed at least `repeated_command_threshold` times.
///
/// Groups are reported in the order their command was first seen.
pub fn detect_repeated_commands(
    observations: &[Observation],
    config: &DetectionConfig,
) -> Vec<Correction> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<CommandExecution>> = HashMap::new();

    for obs in observations {
        if !obs.is_tool(&config.tools.shell) || !obs.is_completed() {
            continue;
        }
        let Some(command) = obs.args.command() else {
            continue;
        };

        let normalized = normalize_command(command);
        let executions = groups.entry(normalized.clone()).or_insert_with(|| {
            order.push(normalized);
            Vec::new()
        });

        executions.push(CommandExecution {
            timestamp: obs.timestamp,
            original_command: command.to_string(),
            success: obs.success,
            duration_ms: obs.duration_ms.clone(),
        });
    }

    order
        .into_iter()
        .filter_map(|command| {
            let executions = groups.remove(&command)?;
            if executions.len() < config.repeated_command_threshold {
                return None;
            }
            build_group(command, executions)
        })
        .collect()
}

fn build_group(command: String, executions: Vec<CommandExecution>) -> Option<Correction> {
    let first = executions.first()?.timestamp;
    let last = executions.last()?.timestamp;
    let count = executions.len();
    let succeeded = executions
        .iter()
        .filter(|e| e.success == Some(true))
        .count();

    Some(Correction {
        timestamp: last,
        signal: CorrectionSignal::RepeatedCommand {
            command,
            count,
            executions,
            context: RepeatedCommandContext {
                first_execution: first,
                last_execution: last,
                success_rate: succeeded as f64 / count as f64,
            },
        },
    })
}
