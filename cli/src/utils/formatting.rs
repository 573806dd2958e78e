//! Output formatting utilities for the storefront CLI

use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;

use crate::config::StorefrontCliConfig;

/// Balance movement of one named account across a scenario
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BalanceChange {
    pub account: String,
    pub address: String,
    pub before: u64,
    pub after: u64,
}

/// A labelled fact read back from the protocol after the scenario ran
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Observation {
    pub label: String,
    pub value: String,
}

/// Everything a scenario command prints
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct ScenarioReport {
    pub scenario: String,
    pub steps: Vec<String>,
    pub observations: Vec<Observation>,
    pub balances: Vec<BalanceChange>,
    pub events: usize,
}

impl ScenarioReport {
    #[must_use]
    pub fn new(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            ..Self::default()
        }
    }

    pub fn step(&mut self, step: impl Into<String>) {
        self.steps.push(step.into());
    }

    pub fn observe(&mut self, label: &str, value: impl ToString) {
        self.observations.push(Observation {
            label: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn balance(&mut self, account: &str, address: String, before: u64, after: u64) {
        self.balances.push(BalanceChange {
            account: account.to_string(),
            address,
            before,
            after,
        });
    }

    /// Observed value for `label`, if recorded
    #[must_use]
    pub fn observation(&self, label: &str) -> Option<&str> {
        self.observations
            .iter()
            .find(|o| o.label == label)
            .map(|o| o.value.as_str())
    }

    /// Balance change for `account`, if recorded
    #[must_use]
    pub fn balance_of(&self, account: &str) -> Option<&BalanceChange> {
        self.balances.iter().find(|b| b.account == account)
    }
}

/// Format a scenario report for human-readable output
#[must_use]
pub fn format_report_human(report: &ScenarioReport, config: &StorefrontCliConfig) -> String {
    let mut output = format!("Scenario: {}\n", report.scenario);

    // Writing into a String cannot fail.
    for (index, step) in report.steps.iter().enumerate() {
        let _ = writeln!(&mut output, "  {}. {step}", index + 1);
    }

    if !report.observations.is_empty() {
        output.push('\n');
        for observation in &report.observations {
            let _ = writeln!(&mut output, "{:<28} {}", observation.label, observation.value);
        }
    }

    if !report.balances.is_empty() {
        output.push('\n');
        let _ = writeln!(
            &mut output,
            "{:<10} {:>14} {:>14}  {:<44}",
            "Account", "Before", "After", "Address"
        );
        output.push_str(&"-".repeat(86));
        output.push('\n');
        for change in &report.balances {
            let _ = writeln!(
                &mut output,
                "{:<10} {:>14} {:>14}  {}",
                change.account,
                config.format_amount(change.before),
                config.format_amount(change.after),
                change.address
            );
        }
    }

    let _ = write!(&mut output, "\nEvents emitted: {}", report.events);
    output
}

/// Format a scenario report as a JSON value
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn format_report_json(report: &ScenarioReport) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(report)?)
}
