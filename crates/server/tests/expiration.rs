mod common;

use chrono::Duration;
use common::{PLAIN, RENAMED, StubProvider, connected, harness_with_config, spec};
use livedata_gateway::{ChannelPublisher, Heartbeat, Subjects};
use livedata_server::{
    ExpirationConfig, HeartbeatOutcome, HeartbeatReceiver, LiveDataServerConfig,
};

#[tokio::test]
async fn test_heartbeat_extends_and_resubscribes_in_one_batch() {
    let h = connected(StubProvider::new()).await;
    let foo = spec(PLAIN, "FOO");
    h.server.subscribe(&[foo.clone()], false).await.unwrap();

    h.clock.advance(Duration::minutes(8));
    let outcome = h
        .server
        .expiration_manager()
        .extend_publication_timeout(&[foo.clone(), spec(PLAIN, "BAR"), spec(RENAMED, "BAZ")])
        .await;

    assert_eq!(
        outcome,
        HeartbeatOutcome {
            extended: 1,
            resubscribed: 2
        }
    );
    assert_eq!(h.provider.subscribe_calls(), 2);
    assert_eq!(
        h.provider.subscribed.lock()[1],
        vec!["BAR".to_string(), "BAZ".to_string()]
    );

    let distributor = h.server.get_market_data_distributor(&foo).await.unwrap();
    assert_eq!(
        distributor.expiry(),
        common::start_time() + Duration::minutes(18)
    );

    // original expiry has passed, the heartbeat keeps it alive
    h.clock.advance(Duration::minutes(8));
    assert_eq!(h.server.expire_subscriptions().await.unwrap(), 0);

    h.clock.advance(Duration::minutes(3));
    assert_eq!(h.server.expire_subscriptions().await.unwrap(), 3);
    assert!(h.server.get_subscriptions().await.is_empty());
}

#[tokio::test]
async fn test_heartbeat_for_unresolvable_spec_is_harmless() {
    let h = connected(StubProvider::new()).await;

    let outcome = h
        .server
        .expiration_manager()
        .extend_publication_timeout(&[spec("Unknown", "X")])
        .await;

    assert_eq!(outcome.extended, 0);
    assert_eq!(outcome.resubscribed, 1);
    assert_eq!(h.provider.subscribe_calls(), 0);
    assert!(h.server.get_subscriptions().await.is_empty());
}

#[tokio::test]
async fn test_heartbeat_while_disconnected_only_extends() {
    let h = connected(StubProvider::new()).await;
    let foo = spec(PLAIN, "FOO");
    h.server.subscribe(&[foo.clone()], false).await.unwrap();
    h.server.disconnect().await.unwrap();

    let outcome = h
        .server
        .expiration_manager()
        .extend_publication_timeout(&[foo, spec(PLAIN, "BAR")])
        .await;

    assert_eq!(outcome.extended, 1);
    assert_eq!(h.provider.subscribe_calls(), 1);
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    common::init_logging();
    let h = harness_with_config(StubProvider::new(), LiveDataServerConfig::default());

    h.server.start().await.unwrap();
    h.server.start().await.unwrap();
    assert!(h.server.is_connected());
    assert!(h.server.is_running());
    assert_eq!(
        h.provider
            .connect_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );

    h.server.stop().await.unwrap();
    h.server.stop().await.unwrap();
    assert!(!h.server.is_connected());
    assert!(!h.server.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_periodic_sweep_expires_idle_distributors() {
    common::init_logging();
    let config = LiveDataServerConfig {
        expiration: ExpirationConfig {
            check_period_ms: 1_000,
            timeout_extension_ms: 60_000,
        },
        ..Default::default()
    };
    let h = harness_with_config(StubProvider::new(), config);
    h.server.start().await.unwrap();

    let idle = spec(PLAIN, "IDLE");
    let pinned = spec(PLAIN, "PINNED");
    h.server.subscribe(&[idle.clone()], false).await.unwrap();
    h.server.subscribe(&[pinned.clone()], true).await.unwrap();

    h.clock.advance(Duration::minutes(2));
    tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;

    assert!(h.server.get_subscription("IDLE").is_none());
    assert!(h.server.is_subscribed_to_specification(&pinned).await);
    assert_eq!(h.provider.unsubscribe_calls(), 1);

    h.server.stop().await.unwrap();
}

#[tokio::test]
async fn test_expire_now_sweeps_immediately() {
    let h = connected(StubProvider::new()).await;
    h.server.subscribe(&[spec(PLAIN, "FOO")], false).await.unwrap();

    h.clock.advance(Duration::minutes(11));

    assert_eq!(h.server.expiration_manager().expire_now().await.unwrap(), 1);
    assert!(h.server.get_subscription("FOO").is_none());
}

#[tokio::test]
async fn test_heartbeats_over_channel() {
    let h = connected(StubProvider::new()).await;
    let foo = spec(PLAIN, "FOO");
    h.server.subscribe(&[foo.clone()], false).await.unwrap();
    let distributor = h.server.get_market_data_distributor(&foo).await.unwrap();

    let (publisher, subscriber) = ChannelPublisher::<Heartbeat>::pair(Subjects::HEARTBEAT, 16);
    let task = HeartbeatReceiver::new(h.server.clone()).spawn(subscriber);

    h.clock.advance(Duration::minutes(5));
    publisher
        .publish_now(Heartbeat::new(vec![foo.clone()]))
        .unwrap();

    let renewed = common::start_time() + Duration::minutes(15);
    tokio::time::timeout(std::time::Duration::from_secs(1), async {
        while distributor.expiry() != renewed {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    task.abort();
}
