//! BDD step definitions for startup seeding

use cucumber::{given, then, when};

use heartbeat::notifier::MessageId;
use heartbeat::status::MonitorStatus;
use heartbeat::store::StateStore;

use crate::world::HeartbeatWorld;

fn parse_status(s: &str) -> MonitorStatus {
    match s {
        "Up" => MonitorStatus::Up,
        "Down" => MonitorStatus::Down,
        "Unknown" => MonitorStatus::Unknown,
        other => panic!("Unknown status: {}", other),
    }
}

#[given("an empty store")]
async fn empty_store(world: &mut HeartbeatWorld) {
    let store = world.store().await;
    assert_eq!(store.get_active_message_id().await.unwrap(), None);
}

#[given(expr = "the store holds message {string}")]
async fn store_holds(world: &mut HeartbeatWorld, id: String) {
    let store = world.store().await;
    store
        .set_active_message_id(&MessageId::new(id))
        .await
        .expect("store write failed");
}

#[given(expr = "the channel still shows message {string}")]
fn channel_shows(world: &mut HeartbeatWorld, id: String) {
    world.channel.insert(&id);
}

#[when("the engine starts")]
async fn engine_starts(world: &mut HeartbeatWorld) {
    world.start_engine().await;
    world.take_baseline();
}

#[then(expr = "the status should be {string}")]
fn status_should_be(world: &mut HeartbeatWorld, expected: String) {
    let expected = parse_status(&expected);
    assert_eq!(world.engine().status(), expected);
}
