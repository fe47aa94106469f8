mod support;

use std::sync::Arc;

use opsagent::{
    agent::{
        Executor,
        planning::{Plan, RawPlan},
        types::StepStatus,
    },
    config::ToolCredentials,
    error::{
        agent_error::AgentError,
        tool_error::{FailureKind, ToolError},
    },
    tools::{GitHubTool, ToolRegistry},
};
use serde_json::{Value, json};

use support::*;

fn plan(value: Value) -> Plan {
    let raw: RawPlan = serde_json::from_value(value).unwrap();
    Plan::try_from(raw).unwrap()
}

fn conversion_plan() -> Plan {
    plan(json!({"steps": [{"tool": "exchange_rate", "parameters": {"from": "USD", "to": "EUR"}}]}))
}

fn executor(transport: &Arc<ScriptedTransport>) -> Executor {
    Executor::new(registry(transport), fast_executor())
}

#[tokio::test]
async fn two_network_errors_then_success_takes_three_attempts() {
    // The secondary endpoint is the credential-less fallback; it stays down
    // so every attempt surfaces the network error to the executor.
    let transport = Arc::new(
        ScriptedTransport::new()
            .route(EXCHANGE_OPEN, vec![network_error(), network_error(), Ok(usd_rates())])
            .route(EXCHANGE_SECONDARY, vec![network_error()]),
    );
    let log = executor(&transport).run(&conversion_plan()).await;

    assert_eq!(log.len(), 1);
    assert_eq!(log[0].status, StepStatus::Ok);
    assert_eq!(log[0].attempt_count, 3);
    assert_eq!(transport.calls_to(EXCHANGE_OPEN), 3);
    assert!(!log[0].degraded);
}

#[tokio::test]
async fn three_network_errors_fail_the_step() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .route(EXCHANGE_OPEN, vec![network_error()])
            .route(EXCHANGE_SECONDARY, vec![network_error()]),
    );
    let log = executor(&transport).run(&conversion_plan()).await;

    assert_eq!(log[0].status, StepStatus::Failed);
    assert_eq!(log[0].attempt_count, 3);
    assert_eq!(log[0].error.as_ref().unwrap().kind, FailureKind::Network);
    assert_eq!(transport.calls_to(EXCHANGE_OPEN), 3);
}

#[tokio::test]
async fn upstream_errors_are_retried_too() {
    let transport = Arc::new(ScriptedTransport::new().route(
        EXCHANGE_OPEN,
        vec![Err(ToolError::upstream(Some(500), "Internal Server Error")), Ok(usd_rates())],
    ));
    let log = executor(&transport).run(&conversion_plan()).await;

    assert_eq!(log[0].status, StepStatus::Ok);
    assert_eq!(log[0].attempt_count, 2);
}

#[tokio::test]
async fn validation_errors_are_not_retried() {
    let transport = Arc::new(ScriptedTransport::new().route(EXCHANGE_OPEN, vec![Ok(usd_rates())]));
    let bad = plan(json!({"steps": [{"tool": "exchange_rate", "parameters": {"from": "dollars", "to": "EUR"}}]}));
    let log = executor(&transport).run(&bad).await;

    assert_eq!(log[0].status, StepStatus::Failed);
    assert_eq!(log[0].attempt_count, 1);
    assert_eq!(log[0].error.as_ref().unwrap().kind, FailureKind::Validation);
    assert!(transport.requests().is_empty());

    let unknown_currency = plan(json!({"steps": [{"tool": "exchange_rate", "parameters": {"from": "USD", "to": "XYZ"}}]}));
    let log = executor(&transport).run(&unknown_currency).await;
    assert_eq!(log[0].attempt_count, 1);
    assert_eq!(log[0].error.as_ref().unwrap().kind, FailureKind::Validation);
    assert_eq!(transport.calls_to(EXCHANGE_OPEN), 1);
}

#[tokio::test]
async fn failure_propagates_without_calling_dependent_tool() {
    let transport = Arc::new(ScriptedTransport::new().route(WTTR, vec![Ok(tokyo_wttr())]));
    let chained = plan(json!({"steps": [
        {"step_number": 1, "tool": "github", "parameters": {"action": "get_repo", "repo": "not-a-repo"}},
        {"step_number": 2, "tool": "weather", "parameters": {"city": "$step_1.repository.name"}},
        {"step_number": 3, "tool": "weather", "parameters": {"city": "Tokyo"}, "depends_on": [2]},
        {"step_number": 4, "tool": "weather", "parameters": {"city": "Tokyo"}}
    ]}));
    let log = executor(&transport).run(&chained).await;

    assert_eq!(log.len(), 4);
    assert_eq!(log[0].error.as_ref().unwrap().kind, FailureKind::Validation);
    for dependent in &log[1..3] {
        assert_eq!(dependent.status, StepStatus::Failed);
        assert_eq!(dependent.attempt_count, 1);
        assert_eq!(dependent.error.as_ref().unwrap().kind, FailureKind::Dependency);
    }
    assert_eq!(log[3].status, StepStatus::Ok);
    assert_eq!(transport.calls_to(WTTR), 1);
    assert!(log.iter().enumerate().all(|(i, r)| r.step_index == i));
}

#[tokio::test]
async fn references_feed_later_steps() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .route(GITHUB_SEARCH, vec![Ok(json!({"total_count": 1, "items": [{
                "name": "Tokyo",
                "full_name": "jp/Tokyo",
                "stargazers_count": 1,
                "forks_count": 0,
                "html_url": "https://github.com/jp/Tokyo"
            }]}))])
            .route(WTTR, vec![Ok(tokyo_wttr())]),
    );
    let chained = plan(json!({"steps": [
        {"tool": "github", "parameters": {"query": "tokyo"}},
        {"tool": "weather", "parameters": {"city": "$step_1.repositories.0.name"}},
        {"tool": "weather", "parameters": {"city": "$step_1.repositories.5.name"}}
    ]}));
    let log = executor(&transport).run(&chained).await;

    assert_eq!(log[1].status, StepStatus::Ok);
    assert_eq!(log[1].output["city"], json!("Tokyo"));
    assert_eq!(log[2].error.as_ref().unwrap().kind, FailureKind::Validation);
    assert_eq!(transport.calls_to(WTTR), 1);
}

#[tokio::test]
async fn anonymous_rate_limit_degrades_instead_of_failing() {
    let transport = Arc::new(ScriptedTransport::new().route(
        GITHUB_SEARCH,
        vec![Err(ToolError::upstream(Some(403), "API rate limit exceeded"))],
    ));
    let log = executor(&transport)
        .run(&plan(json!({"steps": [{"tool": "github", "parameters": {"query": "rust"}}]})))
        .await;

    assert_eq!(log[0].status, StepStatus::Ok);
    assert!(log[0].degraded);
    assert_eq!(log[0].attempt_count, 1);
    assert_eq!(log[0].output["repositories"], json!([]));
}

#[tokio::test]
async fn exchange_falls_back_to_secondary_endpoint() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .route(EXCHANGE_OPEN, vec![network_error()])
            .route(EXCHANGE_SECONDARY, vec![Ok(json!({
                "result": "success",
                "time_last_update_utc": "Wed, 05 Feb 2025 00:00:01 +0000",
                "rates": {"EUR": 0.9}
            }))]),
    );
    let log = executor(&transport).run(&conversion_plan()).await;

    assert_eq!(log[0].status, StepStatus::Ok);
    assert!(log[0].degraded);
    assert_eq!(log[0].output["rate"], json!(0.9));
}

#[tokio::test]
async fn news_without_key_uses_placeholder() {
    let transport = Arc::new(ScriptedTransport::new());
    let log = executor(&transport)
        .run(&plan(json!({"steps": [{"tool": "news", "parameters": {"category": "Technology"}}]})))
        .await;

    assert_eq!(log[0].status, StepStatus::Ok);
    assert!(log[0].degraded);
    assert_eq!(
        log[0].output["articles"][0]["title"],
        json!("Latest Technology News Update")
    );
    assert!(transport.requests().is_empty());
}

#[test]
fn registry_rejects_duplicates_and_unknown_names() {
    let transport = Arc::new(ScriptedTransport::new());
    let mut registry =
        ToolRegistry::with_default_tools(&ToolCredentials::default(), transport.clone()).unwrap();
    let err = registry.register(GitHubTool::new(transport, None)).unwrap_err();
    assert!(matches!(err, AgentError::DuplicateName(ref name) if name == "github"));
    assert!(matches!(registry.get("stocks"), Err(AgentError::ToolNotFound(_))));
    assert_eq!(registry.len(), 4);
}
