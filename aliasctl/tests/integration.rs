//! End-to-end workflow tests
//!
//! The gateway is a mockall mock; the snapshot store is the real file store
//! in a temp directory so the written exports can be inspected.

use std::sync::atomic::Ordering;

use aliasctl::{AliasctlError, CreateRequest, DeleteSource, SnapshotStore};
use generator::{find_bundle, generate_batch};
use shared::{GatewayFailure, SharedError};

mod common;
use common::{ManagerBuilder, TestFixtures, TestHelpers};

/// A rate limit on the third create is retried once and the batch completes
#[tokio::test]
async fn test_transient_failure_retried_within_batch() {
    let mut calls = None;
    let (manager, store, _temp) = ManagerBuilder::new()
        .with_gateway(|gateway| {
            calls = Some(TestHelpers::create_failing_at(
                gateway,
                2,
                GatewayFailure::RateLimited("too many requests".into()),
            ));
        })
        .build();

    let outcome = manager.create_batch(TestHelpers::request(5)).await.unwrap();

    assert_eq!(outcome.succeeded(), 5);
    assert_eq!(outcome.failed(), 0);
    assert_eq!(outcome.retries, 1);
    assert_eq!(calls.unwrap().load(Ordering::SeqCst), 6);
    // the retried item keeps its place in generation order
    assert_eq!(outcome.records[2].rule_id.as_deref(), Some("rule-3"));

    let exported = store.load_records(TestFixtures::DOMAIN).await.unwrap();
    assert_eq!(exported.len(), 5);
    assert!(exported.iter().all(|r| r.is_success() && r.has_password()));
}

/// Names come from (seed, theme, count) alone
#[tokio::test]
async fn test_batch_addresses_follow_seed() {
    let (manager, _store, _temp) = ManagerBuilder::new()
        .with_gateway(|gateway| {
            TestHelpers::create_failing_at(gateway, usize::MAX, GatewayFailure::Network("unused".into()));
        })
        .build();

    let outcome = manager.create_batch(TestHelpers::request(3)).await.unwrap();

    let bundle = find_bundle(TestFixtures::THEME).unwrap();
    let expected: Vec<String> = generate_batch(bundle, TestFixtures::SEED, 3)
        .unwrap()
        .into_iter()
        .map(|name| format!("{name}@{}", TestFixtures::DOMAIN))
        .collect();
    let actual: Vec<String> = outcome.records.iter().map(|r| r.address.clone()).collect();
    assert_eq!(actual, expected);
    assert_eq!(outcome.seed, TestFixtures::SEED);
}

/// A fatal failure is recorded on its item and the batch carries on
#[tokio::test]
async fn test_fatal_failure_does_not_abort_batch() {
    let mut calls = None;
    let (manager, store, _temp) = ManagerBuilder::new()
        .with_gateway(|gateway| {
            calls = Some(TestHelpers::create_failing_at(
                gateway,
                1,
                GatewayFailure::from_status(400, "rule already exists"),
            ));
        })
        .build();

    let outcome = manager.create_batch(TestHelpers::request(3)).await.unwrap();

    assert_eq!(outcome.succeeded(), 2);
    assert_eq!(outcome.failed(), 1);
    assert_eq!(outcome.retries, 0);
    assert_eq!(calls.unwrap().load(Ordering::SeqCst), 3);
    assert_eq!(
        outcome.records[1].error.as_deref(),
        Some("rejected 400: rule already exists")
    );
    // only successes get secrets
    assert_eq!(outcome.credentials.len(), 2);

    let exported = store.load_records(TestFixtures::DOMAIN).await.unwrap();
    assert_eq!(exported.len(), 3);
    let flat = tokio::fs::read_to_string(store.flat_path(TestFixtures::DOMAIN)).await.unwrap();
    assert_eq!(flat.lines().count(), 2);
    assert!(!flat.contains(&outcome.records[1].address));

    let report = tokio::fs::read_to_string(store.compact_path(TestFixtures::DOMAIN)).await.unwrap();
    assert!(report.contains("failed[1]{address,error}:"));
    assert!(report.contains("  seed: 42\n"));
}

/// New aliases land next to a hand-written flat list without touching it
#[tokio::test]
async fn test_new_batch_merges_into_existing_flat_list() {
    let (manager, store, _temp) = ManagerBuilder::new()
        .with_gateway(|gateway| {
            TestHelpers::create_failing_at(gateway, usize::MAX, GatewayFailure::Network("unused".into()));
        })
        .build();
    let flat_path = store.flat_path(TestFixtures::DOMAIN);
    tokio::fs::create_dir_all(flat_path.parent().unwrap()).await.unwrap();
    tokio::fs::write(&flat_path, "old.one@example.com\n").await.unwrap();

    let outcome = manager.create_batch(TestHelpers::request(2)).await.unwrap();

    let flat = tokio::fs::read_to_string(&flat_path).await.unwrap();
    let lines: Vec<&str> = flat.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "old.one@example.com");
    for (line, pair) in lines[1..].iter().zip(&outcome.credentials) {
        assert_eq!(*line, format!("{}:{}", pair.address, pair.password));
    }
}

/// Dry run generates names but makes no remote call and writes nothing
#[tokio::test]
async fn test_dry_run_is_offline() {
    let (manager, store, temp) = ManagerBuilder::new()
        .with_config(|config| config.destination = None)
        .build();

    let request = CreateRequest {
        dry_run: true,
        ..TestHelpers::request(4)
    };
    let outcome = manager.create_batch(request).await.unwrap();

    assert!(outcome.dry_run);
    assert_eq!(outcome.records.len(), 4);
    assert!(outcome.records.iter().all(|r| !r.status.is_terminal()));
    assert!(!store.domain_dir(TestFixtures::DOMAIN).exists());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

/// Structural problems abort before anything is sent
#[tokio::test]
async fn test_structural_errors_abort_early() {
    let (manager, store, _temp) = ManagerBuilder::new().build();

    // 401 names cannot fit a 20 x 20 theme
    let err = manager.create_batch(TestHelpers::request(401)).await.unwrap_err();
    assert!(matches!(err, AliasctlError::Shared(SharedError::CapacityExhausted { .. })));

    let short_secret = CreateRequest {
        password_length: Some(4),
        ..TestHelpers::request(2)
    };
    let err = manager.create_batch(short_secret).await.unwrap_err();
    assert!(matches!(err, AliasctlError::Shared(SharedError::InvalidParameter { .. })));

    let unknown_theme = CreateRequest {
        theme: "no-such-theme".to_string(),
        ..TestHelpers::request(2)
    };
    let err = manager.create_batch(unknown_theme).await.unwrap_err();
    assert!(err.to_string().contains("privacy-guardian"));

    assert!(!store.domain_dir(TestFixtures::DOMAIN).exists());
}

/// Zone id is looked up from the domain when not configured
#[tokio::test]
async fn test_zone_resolved_when_missing() {
    let (manager, _store, _temp) = ManagerBuilder::new()
        .with_config(|config| config.zone_id = None)
        .with_gateway(|gateway| {
            gateway
                .expect_resolve_zone()
                .withf(|domain| domain == TestFixtures::DOMAIN)
                .times(1)
                .returning(|_| Ok(TestFixtures::ZONE_ID.to_string()));
            TestHelpers::create_failing_at(gateway, usize::MAX, GatewayFailure::Network("unused".into()));
        })
        .build();

    let outcome = manager.create_batch(TestHelpers::request(2)).await.unwrap();
    assert_eq!(outcome.succeeded(), 2);
}

/// Create, then delete from the export: rules removed, export pruned
#[tokio::test]
async fn test_delete_from_export_prunes_snapshot() {
    let (manager, store, _temp) = ManagerBuilder::new()
        .with_gateway(|gateway| {
            TestHelpers::create_failing_at(gateway, usize::MAX, GatewayFailure::Network("unused".into()));
            gateway
                .expect_delete_rule()
                .withf(|zone, rule_id| zone == TestFixtures::ZONE_ID && rule_id != "rule-1")
                .times(2)
                .returning(|_, _| Ok(()));
            gateway
                .expect_delete_rule()
                .withf(|_, rule_id| rule_id == "rule-1")
                .times(1)
                .returning(|_, _| Err(GatewayFailure::from_status(404, "rule not found")));
        })
        .build();

    let created = manager.create_batch(TestHelpers::request(3)).await.unwrap();
    let plan = manager.plan_deletion(DeleteSource::Export).await.unwrap();
    assert_eq!(plan.targets.len(), 3);

    let outcome = manager.execute_deletion(&plan).await.unwrap();
    assert_eq!(outcome.deleted(), 2);
    assert_eq!(outcome.failed(), 1);
    assert_eq!(outcome.removed_from_export, 2);

    let remaining = store.load_records(TestFixtures::DOMAIN).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].address, created.records[1].address);

    let report = tokio::fs::read_to_string(store.compact_path(TestFixtures::DOMAIN)).await.unwrap();
    assert!(report.contains("kind: delete"));
}

/// Remote cleanup only targets addresses that look generated
#[tokio::test]
async fn test_delete_remote_uses_classifier() {
    let (manager, _store, _temp) = ManagerBuilder::new()
        .with_gateway(|gateway| {
            let mut all = TestFixtures::GENERATED.to_vec();
            all.extend(TestFixtures::MANUAL);
            TestHelpers::listing(gateway, &all);
        })
        .build();

    let plan = manager.plan_deletion(DeleteSource::Remote).await.unwrap();

    let targets: Vec<&str> = plan.targets.iter().map(|t| t.address.as_str()).collect();
    assert_eq!(targets, TestFixtures::GENERATED.to_vec());
    let skipped: Vec<&str> = plan.skipped.iter().map(|(a, _)| a.as_str()).collect();
    assert_eq!(skipped, TestFixtures::MANUAL.to_vec());
}

/// Secrets go only to exported successes without one, unless regenerating
#[tokio::test]
async fn test_assign_secrets_respects_existing() {
    let (manager, store, _temp) = ManagerBuilder::new().build();
    let update = aliasctl::SnapshotUpdate {
        records: vec![
            TestFixtures::exported("quiet.vault@example.com", "r1", Some("Keep!me12")),
            TestFixtures::exported("silent.shield@example.com", "r2", None),
        ],
        ..Default::default()
    };
    store.merge(TestFixtures::DOMAIN, update).await.unwrap();

    let outcome = manager.assign_secrets(false, 12, false).await.unwrap();
    assert_eq!(outcome.credentials.len(), 1);
    assert_eq!(outcome.kept, 1);
    assert_eq!(outcome.credentials[0].address, "silent.shield@example.com");

    let records = store.load_records(TestFixtures::DOMAIN).await.unwrap();
    assert_eq!(records[0].password.as_deref(), Some("Keep!me12"));
    assert_eq!(records[1].password.as_deref(), Some(outcome.credentials[0].password.as_str()));

    let regenerated = manager.assign_secrets(true, 16, false).await.unwrap();
    assert_eq!(regenerated.credentials.len(), 2);
    let records = store.load_records(TestFixtures::DOMAIN).await.unwrap();
    assert!(records.iter().all(|r| r.password.as_ref().is_some_and(|p| p.len() == 16)));
}

/// A corrupt export stops the run before any rule is created or file rewritten
#[tokio::test]
async fn test_corrupt_export_fails_loudly() {
    let (manager, store, _temp) = ManagerBuilder::new().build();
    let path = store.structured_path(TestFixtures::DOMAIN);
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(&path, "[{\"address\": ").await.unwrap();

    let err = manager.create_batch(TestHelpers::request(1)).await.unwrap_err();
    assert!(matches!(err, AliasctlError::SnapshotCorrupt { .. }));
    assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "[{\"address\": ");
}

/// Re-creating an address that already has a recorded secret keeps that secret
#[tokio::test]
async fn test_create_keeps_recorded_secret() {
    let (manager, store, _temp) = ManagerBuilder::new()
        .with_gateway(|gateway| {
            TestHelpers::create_failing_at(gateway, usize::MAX, GatewayFailure::Network("unused".into()));
        })
        .build();

    let first = manager.create_batch(TestHelpers::request(2)).await.unwrap();
    assert_eq!(first.credentials.len(), 2);
    let before = store.load_records(TestFixtures::DOMAIN).await.unwrap();

    // same seed, so the same two addresses plus one new one
    let second = manager.create_batch(TestHelpers::request(3)).await.unwrap();
    assert_eq!(second.succeeded(), 3);
    assert_eq!(second.credentials.len(), 1);
    assert_eq!(second.credentials[0].address, second.records[2].address);

    let after = store.load_records(TestFixtures::DOMAIN).await.unwrap();
    assert_eq!(after.len(), 3);
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(old.address, new.address);
        assert_eq!(old.password, new.password);
    }
    assert!(after[2].has_password());

    let flat = tokio::fs::read_to_string(store.flat_path(TestFixtures::DOMAIN)).await.unwrap();
    for pair in &first.credentials {
        assert!(flat.contains(&format!("{}:{}", pair.address, pair.password)));
    }
}
