//! Balance report formatting.

use crate::balancer::{BalanceReport, ThreadOutcome};
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use std::collections::BTreeSet;

fn format_cpus(cpus: &BTreeSet<usize>) -> String {
    if cpus.is_empty() {
        return "-".to_string();
    }
    cpus.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn outcome_cell(outcome: &ThreadOutcome) -> Cell {
    match outcome {
        ThreadOutcome::Applied { cpus } => {
            Cell::new(format!("pinned {}", format_cpus(cpus))).fg(Color::Green)
        }
        ThreadOutcome::NotFound(miss) => Cell::new(format!("skipped: {miss}")),
        ThreadOutcome::PermissionDenied => Cell::new("permission denied").fg(Color::Red),
        ThreadOutcome::Failed(message) => Cell::new(format!("failed: {message}")).fg(Color::Red),
    }
}

/// Format the report as a table.
pub fn format_table(report: &BalanceReport) -> String {
    let mut output = String::new();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["PID", "Process", "App", "TID", "Thread", "Before", "Outcome"]);

    for thread in &report.threads {
        table.add_row(vec![
            Cell::new(thread.pid),
            Cell::new(&thread.process),
            Cell::new(thread.app.as_deref().unwrap_or("-")),
            Cell::new(thread.tid),
            Cell::new(&thread.thread),
            Cell::new(
                thread
                    .previous
                    .as_ref()
                    .map(format_cpus)
                    .unwrap_or_else(|| "?".to_string()),
            ),
            outcome_cell(&thread.outcome),
        ]);
    }

    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\nProcesses matching '{}': {}\n",
        report.process_filter, report.processes_matched
    ));
    output.push_str(&format!(
        "Threads: {} pinned, {} skipped, {} denied, {} failed\n",
        report.applied(),
        report.not_found(),
        report.denied(),
        report.failed()
    ));

    output
}

/// Format the report as pretty-printed JSON.
pub fn format_json(report: &BalanceReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
