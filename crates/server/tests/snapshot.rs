mod common;

use common::{NEEDS_BID, PLAIN, RENAMED, StubProvider, connected, harness_with_config, spec};
use livedata_core::{FieldContainer, SubscriptionResult};
use livedata_server::{Error, LiveDataServerConfig};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_snapshot_batches_provider_calls() {
    let provider =
        StubProvider::new().with_snapshot("FOO", FieldContainer::new().with("PRICE", dec!(7)));
    let h = connected(provider).await;
    let specs = vec![
        spec(PLAIN, "FOO"),
        spec(RENAMED, "FOO"),
        spec("Unknown", "X"),
        spec(PLAIN, "MISSING"),
    ];

    let responses = h.server.snapshot(&specs).await.unwrap();

    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0].result, SubscriptionResult::Success);
    let plain = responses[0].snapshot.as_ref().unwrap();
    assert_eq!(plain.fields.get_decimal("PRICE"), Some(dec!(7)));
    assert_eq!(plain.specification, specs[0]);

    let renamed = responses[1].snapshot.as_ref().unwrap();
    assert_eq!(renamed.fields.get_decimal("LAST"), Some(dec!(7)));
    assert!(!renamed.fields.has_field("PRICE"));

    assert_eq!(responses[2].result, SubscriptionResult::NotPresent);
    assert_eq!(responses[3].result, SubscriptionResult::InternalError);

    assert_eq!(h.provider.snapshot_calls(), 1);
    assert_eq!(
        *h.provider.snapshot_requests.lock(),
        vec![vec!["FOO".to_string(), "MISSING".to_string()]]
    );
    // snapshots never create subscriptions
    assert!(h.server.get_subscriptions().await.is_empty());
    assert_eq!(h.provider.subscribe_calls(), 0);
}

#[tokio::test]
async fn test_snapshot_suppressed_by_normalization_is_internal_error() {
    let provider =
        StubProvider::new().with_snapshot("FOO", FieldContainer::new().with("ASK", dec!(101)));
    let h = connected(provider).await;

    let responses = h.server.snapshot(&[spec(NEEDS_BID, "FOO")]).await.unwrap();

    assert_eq!(responses[0].result, SubscriptionResult::InternalError);
    assert!(
        responses[0]
            .user_message
            .as_deref()
            .unwrap()
            .contains("produced no data")
    );
}

#[tokio::test]
async fn test_denied_snapshot_is_not_authorized() {
    let h = connected(StubProvider::new().with_denied("SECRET")).await;

    let responses = h.server.snapshot(&[spec(PLAIN, "SECRET")]).await.unwrap();

    assert_eq!(responses[0].result, SubscriptionResult::NotAuthorized);
    assert_eq!(responses[0].user_message.as_deref(), Some("No entitlement"));
    assert!(responses[0].snapshot.is_none());
}

#[tokio::test]
async fn test_live_distributor_without_values_falls_back_to_provider() {
    let provider =
        StubProvider::new().with_snapshot("FOO", FieldContainer::new().with("PRICE", dec!(3)));
    let h = connected(provider).await;
    let foo = spec(PLAIN, "FOO");
    h.server.subscribe(&[foo.clone()], false).await.unwrap();

    let responses = h.server.snapshot(&[foo]).await.unwrap();

    assert!(responses[0].is_success());
    assert_eq!(
        responses[0].snapshot.as_ref().unwrap().fields.get_decimal("PRICE"),
        Some(dec!(3))
    );
    assert_eq!(h.provider.snapshot_calls(), 1);
}

#[tokio::test]
async fn test_empty_subscription_implies_empty_snapshot() {
    let provider = StubProvider::new()
        .with_empty_implies_empty()
        .with_snapshot("FOO", FieldContainer::new().with("PRICE", dec!(3)));
    let h = connected(provider).await;
    let foo = spec(PLAIN, "FOO");
    h.server.subscribe(&[foo.clone()], false).await.unwrap();

    let responses = h.server.snapshot(&[foo]).await.unwrap();

    assert_eq!(responses[0].result, SubscriptionResult::InternalError);
    assert_eq!(h.provider.snapshot_calls(), 0);
}

#[tokio::test]
async fn test_force_snapshot_bypasses_live_distributor() {
    let provider =
        StubProvider::new().with_snapshot("FOO", FieldContainer::new().with("PRICE", dec!(9)));
    let h = connected(provider).await;
    h.server.subscribe(&[spec(PLAIN, "FOO")], false).await.unwrap();
    h.server
        .live_data_received("FOO", &FieldContainer::new().with("PRICE", dec!(1)));

    let fields = h.server.force_snapshot("FOO").await.unwrap();
    assert_eq!(fields.get_decimal("PRICE"), Some(dec!(9)));
    assert_eq!(h.provider.snapshot_calls(), 1);

    let missing = h.server.force_snapshot("NOPE").await;
    assert!(matches!(missing, Err(Error::Contract(_))));
}

#[tokio::test]
async fn test_snapshot_requires_connection() {
    common::init_logging();
    let h = harness_with_config(StubProvider::new(), LiveDataServerConfig::default());

    let result = h.server.snapshot(&[spec(PLAIN, "FOO")]).await;

    assert!(matches!(result, Err(Error::NotConnected)));
    assert_eq!(h.provider.snapshot_calls(), 0);
}
