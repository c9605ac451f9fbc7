//! End-to-end node run over the simulated feed

use livedata_core::{
    ExternalId, LiveDataSpecification, StandardRules, SubscriptionRequest, SubscriptionResult,
    SubscriptionType, UserPrincipal,
};
use livedata_gateway::{EntitlementRequest, Heartbeat, Requester, Subscriber};
use livedata_runner::{FeedConfig, LiveDataNode, RunnerConfig};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn test_config() -> RunnerConfig {
    RunnerConfig {
        feed: FeedConfig {
            tickers: BTreeMap::from([
                ("FOO".to_string(), dec!(100)),
                ("BAR".to_string(), dec!(50)),
                ("SECRET".to_string(), dec!(10)),
            ]),
            tick_interval_ms: 10,
            seed: Some(42),
            denied: vec!["SECRET".to_string()],
            ..Default::default()
        },
        subscriptions: vec!["FOO".into(), "SECRET".into(), "NOPE".into()],
        ..Default::default()
    }
}

fn sim(raw_id: &str) -> LiveDataSpecification {
    LiveDataSpecification::of(
        StandardRules::OPENGAMMA_RULE_SET_ID,
        ExternalId::of("SIM", raw_id),
    )
}

#[test]
fn test_sample_config_parses() {
    let config =
        RunnerConfig::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/config/node.json")).unwrap();
    assert_eq!(config.feed.tickers.len(), 4);
    assert_eq!(config.subscriptions.len(), 4);
    assert_eq!(config.feed.denied, vec!["RESTRICTED".to_string()]);
}

#[tokio::test]
async fn test_bootstrap_subscribes_and_publishes() {
    init_logging();
    let node = LiveDataNode::bootstrap(test_config()).await.unwrap();

    let results: Vec<SubscriptionResult> =
        node.startup_responses().iter().map(|r| r.result).collect();
    assert_eq!(
        results,
        vec![
            SubscriptionResult::Success,
            SubscriptionResult::NotAuthorized,
            SubscriptionResult::InternalError,
        ]
    );
    assert!(node.server().is_running());
    assert!(node.server().is_subscribed_to_raw_id("FOO"));
    assert!(!node.server().is_subscribed_to_raw_id("SECRET"));

    let mut ticks = node.ticks();
    let tick = tokio::time::timeout(Duration::from_secs(2), ticks.next())
        .await
        .unwrap()
        .unwrap();
    assert!(tick.subject.starts_with("LiveData."));
    assert_eq!(tick.update.specification, sim("FOO"));
    assert!(tick.update.fields.get_decimal("LAST").is_some());
    assert!(tick.update.sequence_number >= 1);

    let stats = node.shutdown().await.unwrap();
    assert_eq!(stats.active_subscriptions, 1);
    assert!(stats.updates_received > 0);
}

#[tokio::test]
async fn test_client_endpoints() {
    init_logging();
    let node = LiveDataNode::bootstrap(test_config()).await.unwrap();
    let user = UserPrincipal::local("alice");

    let reply = node
        .requests()
        .request(&SubscriptionRequest::new(
            user.clone(),
            SubscriptionType::Snapshot,
            vec![sim("BAR"), sim("SECRET")],
        ))
        .await
        .unwrap();
    let bar = reply.responses[0].snapshot.as_ref().unwrap();
    assert_eq!(bar.fields.get_decimal("LAST"), Some(dec!(50)));
    assert_eq!(bar.fields.len(), 3);
    assert_eq!(reply.responses[1].result, SubscriptionResult::NotAuthorized);
    assert!(!node.server().is_subscribed_to_raw_id("BAR"));

    let entitlements = node
        .entitlements()
        .request(&EntitlementRequest::new(user, vec![sim("BAR")]))
        .await
        .unwrap();
    assert_eq!(entitlements.is_entitled(&sim("BAR")), Some(true));

    // heartbeat for something never subscribed brings it up
    node.heartbeats()
        .publish_now(Heartbeat::new(vec![sim("BAR")]))
        .unwrap();
    tokio::time::timeout(Duration::from_secs(2), async {
        while !node.server().is_subscribed_to_raw_id("BAR") {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let stats = node.shutdown().await.unwrap();
    assert_eq!(stats.active_subscriptions, 2);
}
