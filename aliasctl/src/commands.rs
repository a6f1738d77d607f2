//! Command handlers: run a workflow, print its summary to stdout, and report
//! whether every item succeeded.

use std::fmt::Write as _;

use inquire::Confirm;

use generator::builtin_bundles;
use shared::AliasRecord;

use crate::error::{AliasctlError, AliasctlResult};
use crate::manager::{AliasManager, CreateOutcome, CreateRequest, DeleteOutcome, DeletePlan, DeleteSource, SecretsOutcome, VerifyReport};
use crate::traits::{RuleGateway, SnapshotStore};

/// Overall result of a command, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Completed, but at least one item failed
    PartialFailure,
}

impl CommandStatus {
    fn from_failures(failed: usize) -> Self {
        if failed == 0 {
            CommandStatus::Success
        } else {
            CommandStatus::PartialFailure
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::PartialFailure => 1,
        }
    }
}

pub async fn create<G: RuleGateway, S: SnapshotStore>(
    manager: &AliasManager<G, S>,
    request: CreateRequest,
) -> AliasctlResult<CommandStatus> {
    let outcome = manager.create_batch(request).await?;
    print!("{}", create_summary(&outcome));
    Ok(CommandStatus::from_failures(outcome.failed()))
}

pub async fn delete<G: RuleGateway, S: SnapshotStore>(
    manager: &AliasManager<G, S>,
    source: DeleteSource,
    dry_run: bool,
    assume_yes: bool,
) -> AliasctlResult<CommandStatus> {
    let plan = manager.plan_deletion(source).await?;
    print!("{}", plan_summary(&plan, source));

    if plan.targets.is_empty() || dry_run {
        if dry_run {
            println!("Dry run: nothing was deleted.");
        }
        return Ok(CommandStatus::Success);
    }

    if !assume_yes && !confirm(&format!("Delete {} forwarding rules?", plan.targets.len()))? {
        return Err(AliasctlError::Aborted);
    }

    let outcome = manager.execute_deletion(&plan).await?;
    print!("{}", delete_summary(&outcome));
    Ok(CommandStatus::from_failures(outcome.failed()))
}

pub async fn passwords<G: RuleGateway, S: SnapshotStore>(
    manager: &AliasManager<G, S>,
    regenerate: bool,
    length: usize,
    dry_run: bool,
) -> AliasctlResult<CommandStatus> {
    let outcome = manager.assign_secrets(regenerate, length, dry_run).await?;
    print!("{}", secrets_summary(&outcome, dry_run));
    Ok(CommandStatus::Success)
}

pub async fn convert<G: RuleGateway, S: SnapshotStore>(manager: &AliasManager<G, S>) -> AliasctlResult<CommandStatus> {
    let lines = manager.convert().await?;
    println!("Flat list rebuilt: {lines} lines");
    Ok(CommandStatus::Success)
}

pub async fn verify<G: RuleGateway, S: SnapshotStore>(manager: &AliasManager<G, S>) -> AliasctlResult<CommandStatus> {
    let report = manager.verify().await?;
    print!("{}", verify_summary(&report));
    Ok(CommandStatus::Success)
}

pub async fn list<G: RuleGateway, S: SnapshotStore>(manager: &AliasManager<G, S>) -> AliasctlResult<CommandStatus> {
    let rules = manager.classified_rules().await?;
    let generated = rules.iter().filter(|(_, generated)| *generated).count();
    for (rule, is_generated) in &rules {
        let marker = if *is_generated { "generated" } else { "manual" };
        let state = if rule.enabled { "" } else { " (disabled)" };
        println!("{:<10} {}{}  [{}]", marker, rule.address, state, rule.rule_id);
    }
    println!("{} rules, {} generated, {} manual", rules.len(), generated, rules.len() - generated);
    Ok(CommandStatus::Success)
}

pub fn themes() -> CommandStatus {
    for bundle in builtin_bundles() {
        println!(
            "{:<18} {} prefixes x {} suffixes = {} names",
            bundle.key(),
            bundle.prefixes().len(),
            bundle.suffixes().len(),
            bundle.capacity()
        );
    }
    CommandStatus::Success
}

fn confirm(question: &str) -> AliasctlResult<bool> {
    Ok(Confirm::new(question)
        .with_default(false)
        .with_help_message("Generated-looking addresses are matched by pattern only; check the list above")
        .prompt()?)
}

fn push_failures(out: &mut String, records: &[AliasRecord]) {
    for record in records.iter().filter(|r| r.status.is_terminal() && !r.is_success()) {
        let _ = writeln!(
            out,
            "  ✗ {}: {}",
            record.address,
            record.error.as_deref().unwrap_or("unknown error")
        );
    }
}

pub fn create_summary(outcome: &CreateOutcome) -> String {
    let mut out = String::new();
    if outcome.dry_run {
        let _ = writeln!(
            out,
            "Dry run: {} addresses from '{}' (seed {})",
            outcome.records.len(),
            outcome.theme,
            outcome.seed
        );
        for record in &outcome.records {
            let _ = writeln!(out, "  {}", record.address);
        }
        return out;
    }

    let _ = writeln!(out, "Theme '{}', seed {}", outcome.theme, outcome.seed);
    let _ = writeln!(
        out,
        "Created {} of {} aliases ({} failed, {} retries)",
        outcome.succeeded(),
        outcome.records.len(),
        outcome.failed(),
        outcome.retries
    );
    push_failures(&mut out, &outcome.records);
    if let Some(merge) = &outcome.merge {
        let _ = writeln!(
            out,
            "Export: {} records, {} lines, {} secrets set",
            merge.structured_total, merge.flat_total, merge.passwords_set
        );
    }
    out
}

pub fn plan_summary(plan: &DeletePlan, source: DeleteSource) -> String {
    let mut out = String::new();
    let origin = match source {
        DeleteSource::Export => "export",
        DeleteSource::Remote => "remote listing",
    };
    let _ = writeln!(out, "{} rules selected from {}:", plan.targets.len(), origin);
    for target in &plan.targets {
        let _ = writeln!(out, "  - {} [{}]", target.address, target.rule_id);
    }
    if !plan.skipped.is_empty() {
        let _ = writeln!(out, "{} skipped:", plan.skipped.len());
        for (address, reason) in &plan.skipped {
            let _ = writeln!(out, "  · {address} ({reason})");
        }
    }
    out
}

pub fn delete_summary(outcome: &DeleteOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Deleted {} of {} rules ({} failed, {} retries); {} removed from export",
        outcome.deleted(),
        outcome.records.len(),
        outcome.failed(),
        outcome.retries,
        outcome.removed_from_export
    );
    push_failures(&mut out, &outcome.records);
    out
}

pub fn secrets_summary(outcome: &SecretsOutcome, dry_run: bool) -> String {
    let mut out = String::new();
    let verb = if dry_run { "Would set" } else { "Set" };
    let _ = writeln!(
        out,
        "{} {} secrets ({} kept)",
        verb,
        outcome.credentials.len(),
        outcome.kept
    );
    let unmatched = outcome.merge.map_or(0, |merge| merge.unmatched_credentials);
    if unmatched > 0 {
        let _ = writeln!(out, "  {unmatched} secrets had no matching record");
    }
    out
}

pub fn verify_summary(report: &VerifyReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Token {} is {}", report.token.id, report.token.status);
    if let (Some(domain), Some(zone_id)) = (&report.domain, &report.zone_id) {
        let _ = writeln!(out, "Zone for {domain}: {zone_id}");
    }
    if let (Some(rules), Some(generated)) = (report.rule_count, report.generated_count) {
        let _ = writeln!(out, "{rules} forwarding rules ({generated} generated)");
    }
    out
}
