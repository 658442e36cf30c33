use std::time::{Duration, Instant};

use ov_bridge::{Bridge, BridgeHooks, BridgeTimeoutConfig, RecordingMixerPool, RecordingSink, StaticDb};
use serde_json::json;
use uuid::Uuid;

const PROXY: i32 = 1;
const MIXER: i32 = 2;

fn registered_bridge(db: &StaticDb) -> (Bridge, RecordingSink, RecordingMixerPool) {
    let mut bridge = Bridge::new(BridgeTimeoutConfig::default(), BridgeHooks::new());
    let mut sink = RecordingSink::default();
    let mut pool = RecordingMixerPool::default();
    bridge.handle_inbound(
        &mut sink,
        &mut pool,
        db,
        PROXY,
        ov_bridge::envelope::request("register", Uuid::new_v4(), json!({})),
    );
    (bridge, sink, pool)
}

/// spec.md §8 scenario 6: a database with two SIP entries whose
/// whitelists combine to three distinct callers yields three `permit`
/// events, in order, on gateway registration.
#[test]
fn permission_batch_is_emitted_in_order_on_register() {
    let db = StaticDb {
        loops: Default::default(),
        whitelist: vec!["alice".to_string(), "bob".to_string(), "carol".to_string()],
    };
    let (_bridge, sink, _pool) = registered_bridge(&db);

    let permits = sink.events_for(PROXY);
    assert_eq!(permits.len(), 3);
    let callers: Vec<&str> = permits.iter().map(|v| v["parameter"]["caller"].as_str().unwrap()).collect();
    assert_eq!(callers, vec!["alice", "bob", "carol"]);
    assert!(permits.iter().all(|v| v["event"] == "permit"));
}

/// spec.md §8 scenario 5: an `acquire` pending request expires before
/// the mixer answers. Bridge must not deliver the late success to the
/// original client, and must compensate with a release.
#[test]
fn late_success_after_expiry_never_reaches_the_client_and_is_reversed() {
    let db = StaticDb::default();
    let mut bridge = Bridge::new(BridgeTimeoutConfig { response_usec: 1 }, BridgeHooks::new());
    let mut sink = RecordingSink::default();
    let mut pool = RecordingMixerPool::default();
    bridge.handle_inbound(&mut sink, &mut pool, &db, PROXY, ov_bridge::envelope::request("register", Uuid::new_v4(), json!({})));

    let uuid = Uuid::new_v4();
    bridge.handle_inbound(
        &mut sink,
        &mut pool,
        &db,
        PROXY,
        ov_bridge::envelope::request("acquire", uuid, json!({"user": "dana"})),
    );

    std::thread::sleep(Duration::from_millis(2));
    bridge.expire_timeouts(Instant::now(), &mut sink);

    let client_events = sink.events_for(PROXY);
    assert_eq!(client_events.len(), 1, "client sees exactly the synthesized timeout, nothing else yet");
    assert_eq!(client_events[0]["error"]["code"], 4);
    assert_eq!(client_events[0]["event"], "acquire");

    bridge.handle_inbound(
        &mut sink,
        &mut pool,
        &db,
        MIXER,
        ov_bridge::envelope::success("acquire", uuid, json!({"user": "dana"})),
    );

    assert_eq!(sink.events_for(PROXY).len(), 1, "no second reply for the late success");
    assert_eq!(pool.releases, vec!["dana".to_string()], "compensating release issued to the mixer pool");
}

#[test]
fn acquire_success_within_deadline_assigns_the_mixer_and_replies_once() {
    let db = StaticDb::default();
    let (mut bridge, mut sink, mut pool) = registered_bridge(&db);

    let uuid = Uuid::new_v4();
    bridge.handle_inbound(
        &mut sink,
        &mut pool,
        &db,
        PROXY,
        ov_bridge::envelope::request("acquire", uuid, json!({"user": "erin"})),
    );
    bridge.handle_inbound(
        &mut sink,
        &mut pool,
        &db,
        MIXER,
        ov_bridge::envelope::success("acquire", uuid, json!({"user": "erin"})),
    );

    let replies: Vec<_> = sink.events_for(PROXY).into_iter().filter(|v| v["event"] == "acquire").collect();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].get("error").is_none());
    assert!(pool.releases.is_empty());
}
