//! Multi-unit deployment tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bootline::deploy::{MultiUnitDeployment, SpawnLauncher, UnitRegistry};
use bootline::models::unit::{AggregateResult, UnitSpec};
use serde_json::json;
use tokio_test::{assert_ready_eq, task};

use crate::support::{test_registry, test_spec, TestLauncher};

fn deployment(registry: UnitRegistry) -> MultiUnitDeployment {
    MultiUnitDeployment::new(Arc::new(registry), Arc::new(TestLauncher::new()))
}

#[tokio::test]
async fn test_replicas_all_succeed() {
    let stops = Arc::new(AtomicUsize::new(0));
    let deployment = deployment(test_registry(stops));

    let specs = vec![
        test_spec("api"),
        test_spec("worker").with_instances(2),
        test_spec("cron").with_instances(1),
    ];
    let handle = deployment.deploy(specs);
    assert_eq!(handle.total(), 4);
    assert_eq!(handle.await, AggregateResult::Success { total: 4 });

    let deployments = deployment.deployments().await;
    assert_eq!(deployments.len(), 4);
    assert_eq!(deployments.iter().filter(|d| d.name == "worker").count(), 2);
    assert!(deployments.iter().all(|d| d.id.starts_with(&d.name)));
}

#[tokio::test]
async fn test_empty_round_resolves_immediately() {
    let deployment = deployment(UnitRegistry::new());
    let mut handle = task::spawn(deployment.deploy(Vec::new()));
    assert_ready_eq!(handle.poll(), AggregateResult::Success { total: 0 });
}

#[tokio::test]
async fn test_mixed_failures_are_counted() {
    let stops = Arc::new(AtomicUsize::new(0));
    let deployment = deployment(test_registry(stops));

    let specs = vec![
        test_spec("ok").with_instances(3),
        test_spec("failing").with_config(json!({ "fail": true })),
        test_spec("empty-id"),
    ];
    let result = deployment.deploy(specs).await;

    assert_eq!(result, AggregateResult::Failure { failed: 2, total: 5 });
    assert!(result.to_string().contains("2 of 5 failed"));
    assert_eq!(deployment.deployments().await.len(), 3);
}

#[tokio::test]
async fn test_build_error_reports_failure() {
    let deployment = deployment(test_registry(Arc::new(AtomicUsize::new(0))));
    let result = deployment
        .deploy(vec![UnitSpec::new("db").with_kind("broken")])
        .await;
    assert_eq!(result, AggregateResult::Failure { failed: 1, total: 1 });
    assert_eq!(result.to_string(), "1 of 1 failed to deploy");
}

#[tokio::test]
async fn test_factory_panic_reports_failure() {
    let deployment = deployment(test_registry(Arc::new(AtomicUsize::new(0))));
    let result = deployment
        .deploy(vec![
            UnitSpec::new("bad").with_kind("panicky"),
            test_spec("good"),
        ])
        .await;
    assert_eq!(result, AggregateResult::Failure { failed: 1, total: 2 });
}

#[tokio::test]
async fn test_start_panic_reports_failure() {
    let deployment = deployment(test_registry(Arc::new(AtomicUsize::new(0))));
    let result = deployment
        .deploy(vec![test_spec("volatile")
            .with_instances(2)
            .with_config(json!({ "panic": true }))])
        .await;
    assert_eq!(result, AggregateResult::Failure { failed: 2, total: 2 });
    assert!(deployment.deployments().await.is_empty());
}

#[tokio::test]
async fn test_unknown_kind_and_rejected_launch() {
    let deployment = deployment(test_registry(Arc::new(AtomicUsize::new(0))));
    let result = deployment
        .deploy(vec![
            UnitSpec::new("mystery"),
            test_spec("rejected"),
            test_spec("fine"),
        ])
        .await;
    assert_eq!(result, AggregateResult::Failure { failed: 2, total: 3 });
}

#[tokio::test]
async fn test_undeploy_stops_only_deployed_units() {
    let stops = Arc::new(AtomicUsize::new(0));
    let deployment = deployment(test_registry(stops.clone()));

    let result = deployment
        .deploy(vec![
            test_spec("web").with_instances(2),
            test_spec("flaky").with_config(json!({ "fail": true })),
        ])
        .await;
    assert_eq!(result.failed(), 1);

    assert_eq!(deployment.undeploy_all().await, 2);
    assert_eq!(stops.load(Ordering::SeqCst), 2);
    assert!(deployment.deployments().await.is_empty());
    assert_eq!(deployment.undeploy_all().await, 0);
}

#[tokio::test]
async fn test_builtin_units_with_spawn_launcher() {
    let deployment = MultiUnitDeployment::new(
        Arc::new(UnitRegistry::with_builtins()),
        Arc::new(SpawnLauncher::new()),
    );

    let result = deployment
        .deploy(vec![
            UnitSpec::new("hello").with_kind("log").with_instances(2),
            UnitSpec::new("slow").with_kind("delay").with_config(json!({ "delay_ms": 20 })),
            UnitSpec::new("cmd").with_kind("command"),
        ])
        .await;

    // The command unit has no program configured
    assert_eq!(result, AggregateResult::Failure { failed: 1, total: 4 });
    assert_eq!(deployment.undeploy_all().await, 3);
}

#[tokio::test]
async fn test_oversized_round_fails_without_launching() {
    let stops = Arc::new(AtomicUsize::new(0));
    let deployment = deployment(test_registry(stops));

    let specs: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|name| test_spec(name).with_instances(i64::MAX))
        .collect();
    let mut handle = task::spawn(deployment.deploy(specs));

    assert_ready_eq!(handle.poll(), AggregateResult::Failure { failed: 3, total: 3 });
    assert!(deployment.deployments().await.is_empty());
}

#[tokio::test]
async fn test_settle_waits_for_abandoned_round() {
    let stops = Arc::new(AtomicUsize::new(0));
    let deployment = deployment(test_registry(stops.clone()));

    drop(deployment.deploy(vec![
        test_spec("slow").with_config(json!({ "delay_ms": 100 })),
        test_spec("quick"),
    ]));

    deployment.settle().await;
    assert_eq!(deployment.deployments().await.len(), 2);
    assert_eq!(deployment.undeploy_all().await, 2);
    assert_eq!(stops.load(Ordering::SeqCst), 2);
}
