//! Batch workflows
//!
//! [`AliasManager`] owns the configuration, the injected gateway and store,
//! and the batch id for one invocation. Every workflow runs items strictly
//! one after another with the configured delay between remote calls, and
//! touches the snapshot only after the network phase is over.

use std::collections::HashSet;

use rand::RngCore;
use rand::rngs::OsRng;

use generator::{Classifier, NameSynthesizer, SecretSynthesizer, find_bundle, theme_keys};
use shared::{
    AliasRecord, BatchId, CredentialPair, GatewayFailure, RuleSummary, SharedError, batch_debug, batch_info,
    batch_warn, logging,
};

use crate::config::AppConfig;
use crate::error::{AliasctlError, AliasctlResult};
use crate::services::export::{MergeSummary, ReportKind, ReportSection};
use crate::traits::{RuleGateway, SnapshotStore, SnapshotUpdate, TokenStatus};

/// Parameters for one `create` run
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub theme: String,
    pub count: usize,
    /// Falls back to the configured seed, then to a random one
    pub seed: Option<u32>,
    pub dry_run: bool,
    /// Secret length, or `None` to skip secrets
    pub password_length: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub theme: String,
    pub seed: u32,
    pub dry_run: bool,
    /// One record per generated address, in generation order
    pub records: Vec<AliasRecord>,
    pub credentials: Vec<CredentialPair>,
    /// Retries spent across the batch
    pub retries: u32,
    pub merge: Option<MergeSummary>,
}

impl CreateOutcome {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.status.is_terminal() && !r.is_success()).count()
    }
}

/// Where deletion targets come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSource {
    /// Rule ids recorded in the structured list
    Export,
    /// Remote listing filtered by the classifier
    Remote,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletePlan {
    pub targets: Vec<RuleSummary>,
    /// Addresses left alone, with the reason
    pub skipped: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub records: Vec<AliasRecord>,
    pub retries: u32,
    pub removed_from_export: usize,
}

impl DeleteOutcome {
    pub fn deleted(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.deleted()
    }
}

#[derive(Debug, Clone)]
pub struct SecretsOutcome {
    pub credentials: Vec<CredentialPair>,
    /// Successful records that already had a secret and were left alone
    pub kept: usize,
    pub merge: Option<MergeSummary>,
}

#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub token: TokenStatus,
    pub domain: Option<String>,
    pub zone_id: Option<String>,
    pub rule_count: Option<usize>,
    pub generated_count: Option<usize>,
}

pub struct AliasManager<G, S>
where
    G: RuleGateway,
    S: SnapshotStore,
{
    config: AppConfig,
    gateway: G,
    store: S,
    batch_id: BatchId,
    classifier: Classifier,
}

impl<G, S> AliasManager<G, S>
where
    G: RuleGateway,
    S: SnapshotStore,
{
    pub fn new(config: AppConfig, gateway: G, store: S) -> Self {
        Self {
            config,
            gateway,
            store,
            batch_id: BatchId::new(),
            classifier: Classifier::builtin(),
        }
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Configured zone id, or the one the provider reports for the domain
    pub async fn zone_id(&self) -> AliasctlResult<String> {
        if let Some(zone_id) = &self.config.zone_id {
            return Ok(zone_id.clone());
        }
        let domain = self.config.require_domain()?;
        let attempted = self
            .config
            .retry
            .execute("zone lookup", || self.gateway.resolve_zone(domain))
            .await;
        let zone_id = attempted
            .result
            .map_err(|failure| AliasctlError::gateway("zone lookup", failure))?;
        batch_debug!(self.batch_id, "resolved zone {} for {}", zone_id, domain);
        Ok(zone_id)
    }

    async fn pause(&self, index: usize) {
        if index > 0 && !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }
    }

    /// Generate, create and export one themed batch
    pub async fn create_batch(&self, request: CreateRequest) -> AliasctlResult<CreateOutcome> {
        let domain = self.config.require_domain()?;
        let bundle = find_bundle(&request.theme).ok_or_else(|| {
            SharedError::invalid(
                "theme",
                &request.theme,
                format!("unknown theme; choose one of {}", theme_keys().join(", ")),
            )
        })?;
        if request.count == 0 {
            return Err(SharedError::invalid("count", request.count, "must be at least 1").into());
        }
        let synthesizer = request.password_length.map(SecretSynthesizer::new).transpose()?;
        let seed = request.seed.or(self.config.seed).unwrap_or_else(|| OsRng.next_u32());

        logging::log_startup(
            &self.batch_id,
            &format!("{} aliases from '{}' (seed {}) for {}", request.count, bundle.key(), seed, domain),
        );

        let names = NameSynthesizer::new(bundle, seed).generate(request.count)?;
        // drawn up front so an exhausted secret space aborts before any remote call
        let secrets = match &synthesizer {
            Some(synthesizer) => synthesizer.generate_unique(names.len())?,
            None => Vec::new(),
        };

        let mut records: Vec<AliasRecord> = names
            .iter()
            .map(|name| AliasRecord::pending(format!("{name}@{domain}"), Some(bundle.key())))
            .collect();

        if request.dry_run {
            batch_info!(self.batch_id, "dry run: {} addresses generated, nothing submitted", records.len());
            return Ok(CreateOutcome {
                theme: bundle.key().to_string(),
                seed,
                dry_run: true,
                records,
                credentials: Vec::new(),
                retries: 0,
                merge: None,
            });
        }

        let destination = self.config.require_destination()?;
        // an unreadable export must stop the run before any rule exists
        let recorded: HashSet<String> = self
            .store
            .load_records(domain)
            .await?
            .into_iter()
            .filter(AliasRecord::has_password)
            .map(|r| r.address.to_lowercase())
            .collect();
        let zone_id = self.zone_id().await?;

        let mut retries = 0;
        let total = records.len();
        for (index, record) in records.iter_mut().enumerate() {
            self.pause(index).await;
            let address = record.address.clone();
            let attempted = self
                .config
                .retry
                .execute(&format!("create {address}"), || {
                    self.gateway.create_rule(&zone_id, &address, destination)
                })
                .await;
            retries += attempted.retries();

            match attempted.result {
                Ok(rule_id) => {
                    logging::log_progress(&self.batch_id, "created", &format!("[{}/{}] {}", index + 1, total, address));
                    record.complete(Ok(rule_id));
                }
                Err(failure) => {
                    logging::log_error(&self.batch_id, &format!("create {address}"), &failure);
                    record.complete(Err(&failure));
                }
            }
        }

        // a secret already in the export is only replaced by `passwords --regenerate`
        let credentials: Vec<CredentialPair> = records
            .iter()
            .filter(|r| r.is_success() && !recorded.contains(&r.address.to_lowercase()))
            .zip(secrets)
            .map(|(record, secret)| CredentialPair::new(record.address.clone(), secret))
            .collect();

        let report = ReportSection::new(ReportKind::Create, self.batch_id, domain)
            .with_theme(Some(bundle.key()), Some(seed))
            .with_records(&records, &credentials);
        let merge = self
            .store
            .merge(
                domain,
                SnapshotUpdate {
                    records: records.clone(),
                    credentials: credentials.clone(),
                    report: Some(report),
                },
            )
            .await?;

        let outcome = CreateOutcome {
            theme: bundle.key().to_string(),
            seed,
            dry_run: false,
            records,
            credentials,
            retries,
            merge: Some(merge),
        };
        if outcome.failed() == 0 {
            logging::log_success(&self.batch_id, &format!("{} aliases created", outcome.succeeded()));
        } else {
            batch_warn!(
                self.batch_id,
                "{} of {} aliases failed",
                outcome.failed(),
                outcome.records.len()
            );
        }
        Ok(outcome)
    }

    /// Decide which rules a delete run would remove
    pub async fn plan_deletion(&self, source: DeleteSource) -> AliasctlResult<DeletePlan> {
        let domain = self.config.require_domain()?;
        let mut plan = DeletePlan::default();

        match source {
            DeleteSource::Export => {
                for record in self.store.load_records(domain).await? {
                    match (&record.rule_id, record.is_success()) {
                        (Some(rule_id), true) => plan.targets.push(RuleSummary {
                            rule_id: rule_id.clone(),
                            address: record.address.clone(),
                            enabled: true,
                        }),
                        _ => plan
                            .skipped
                            .push((record.address.clone(), "no rule was created".to_string())),
                    }
                }
            }
            DeleteSource::Remote => {
                for rule in self.list_rules().await? {
                    if self.classifier.is_generated(&rule.address) {
                        plan.targets.push(rule);
                    } else {
                        plan.skipped.push((rule.address, "does not look generated".to_string()));
                    }
                }
            }
        }

        batch_info!(
            self.batch_id,
            "delete plan: {} targets, {} skipped",
            plan.targets.len(),
            plan.skipped.len()
        );
        Ok(plan)
    }

    /// Delete every planned rule, then prune the deleted addresses from the
    /// snapshot. Per-rule failures are recorded and do not stop the run.
    pub async fn execute_deletion(&self, plan: &DeletePlan) -> AliasctlResult<DeleteOutcome> {
        let domain = self.config.require_domain()?;
        if plan.targets.is_empty() {
            return Ok(DeleteOutcome {
                records: Vec::new(),
                retries: 0,
                removed_from_export: 0,
            });
        }
        let zone_id = self.zone_id().await?;

        let mut records = Vec::with_capacity(plan.targets.len());
        let mut retries = 0;
        for (index, target) in plan.targets.iter().enumerate() {
            self.pause(index).await;
            let attempted = self
                .config
                .retry
                .execute(&format!("delete {}", target.address), || {
                    self.gateway.delete_rule(&zone_id, &target.rule_id)
                })
                .await;
            retries += attempted.retries();

            let mut record = AliasRecord::pending(target.address.clone(), None);
            match attempted.result {
                Ok(()) => {
                    logging::log_progress(&self.batch_id, "deleted", &target.address);
                    record.complete(Ok(target.rule_id.clone()));
                }
                Err(failure) => {
                    logging::log_error(&self.batch_id, &format!("delete {}", target.address), &failure);
                    record.complete(Err(&failure));
                }
            }
            records.push(record);
        }

        let deleted: Vec<String> = records
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.address.clone())
            .collect();
        let report = ReportSection::new(ReportKind::Delete, self.batch_id, domain).with_records(&records, &[]);
        let removed_from_export = self.store.remove(domain, deleted, Some(report)).await?;

        Ok(DeleteOutcome {
            records,
            retries,
            removed_from_export,
        })
    }

    /// Give secrets to exported successes; `regenerate` replaces existing ones
    pub async fn assign_secrets(&self, regenerate: bool, length: usize, dry_run: bool) -> AliasctlResult<SecretsOutcome> {
        let domain = self.config.require_domain()?;
        let synthesizer = SecretSynthesizer::new(length)?;
        let records = self.store.load_records(domain).await?;

        let (targets, kept): (Vec<&AliasRecord>, Vec<&AliasRecord>) = records
            .iter()
            .filter(|r| r.is_success())
            .partition(|r| regenerate || !r.has_password());

        if targets.is_empty() {
            batch_info!(self.batch_id, "every exported alias already has a secret");
            return Ok(SecretsOutcome {
                credentials: Vec::new(),
                kept: kept.len(),
                merge: None,
            });
        }

        let credentials = synthesizer.credentials_for(targets.iter().map(|r| r.address.clone()))?;
        if dry_run {
            return Ok(SecretsOutcome {
                credentials,
                kept: kept.len(),
                merge: None,
            });
        }

        let targeted: Vec<AliasRecord> = targets.into_iter().cloned().collect();
        let report = ReportSection::new(ReportKind::Passwords, self.batch_id, domain).with_records(&targeted, &credentials);
        let merge = self
            .store
            .merge(
                domain,
                SnapshotUpdate {
                    records: Vec::new(),
                    credentials: credentials.clone(),
                    report: Some(report),
                },
            )
            .await?;
        logging::log_success(&self.batch_id, &format!("{} secrets written", merge.passwords_set));

        Ok(SecretsOutcome {
            credentials,
            kept: kept.len(),
            merge: Some(merge),
        })
    }

    /// Rebuild the flat list from the structured list; returns its line count
    pub async fn convert(&self) -> AliasctlResult<usize> {
        let domain = self.config.require_domain()?;
        let lines = self.store.convert_to_flat(domain).await?;
        logging::log_success(&self.batch_id, &format!("flat list for {domain} has {lines} lines"));
        Ok(lines)
    }

    /// Check the token and, when a domain is configured, that its rules can be read
    pub async fn verify(&self) -> AliasctlResult<VerifyReport> {
        let attempted = self
            .config
            .retry
            .execute("token verification", || self.gateway.verify_token())
            .await;
        let token = attempted
            .result
            .map_err(|failure| AliasctlError::gateway("token verification", failure))?;
        if !token.is_active() {
            return Err(AliasctlError::gateway(
                "token verification",
                GatewayFailure::Unauthorized(format!("token {} is {}", token.id, token.status)),
            ));
        }

        let mut report = VerifyReport {
            token,
            domain: self.config.domain.clone(),
            zone_id: None,
            rule_count: None,
            generated_count: None,
        };
        if self.config.domain.is_some() {
            report.zone_id = Some(self.zone_id().await?);
            let rules = self.list_rules().await?;
            report.generated_count = Some(rules.iter().filter(|r| self.classifier.is_generated(&r.address)).count());
            report.rule_count = Some(rules.len());
        }
        Ok(report)
    }

    /// Remote rules for the domain with their generated/manual classification
    pub async fn classified_rules(&self) -> AliasctlResult<Vec<(RuleSummary, bool)>> {
        Ok(self
            .list_rules()
            .await?
            .into_iter()
            .map(|rule| {
                let generated = self.classifier.is_generated(&rule.address);
                (rule, generated)
            })
            .collect())
    }

    async fn list_rules(&self) -> AliasctlResult<Vec<RuleSummary>> {
        let domain = self.config.require_domain()?;
        let zone_id = self.zone_id().await?;
        let attempted = self
            .config
            .retry
            .execute("list rules", || self.gateway.list_rules(&zone_id, domain))
            .await;
        attempted
            .result
            .map_err(|failure| AliasctlError::gateway("list rules", failure))
    }
}
