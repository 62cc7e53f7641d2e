//! BDD step definitions for the reconciliation feature

use cucumber::{given, then, when};

use crate::common::StoreWrite;
use crate::world::HeartbeatWorld;

async fn poll(world: &mut HeartbeatWorld) {
    world.run_cycle().await;
    if let Some(Err(e)) = &world.last_outcome {
        panic!("cycle failed: {}", e);
    }
}

#[given("the engine has announced the site is up")]
async fn announced_up(world: &mut HeartbeatWorld) {
    world.store().await;
    world.start_engine().await;
    world.site.respond_with(200);
    poll(world).await;
    assert_eq!(world.channel.sent_count(), 1);
    world.take_baseline();
}

fn delete_last_sent(world: &HeartbeatWorld) {
    let (id, _) = world.channel.last_sent().expect("nothing was sent");
    world.channel.delete(&id);
}

#[given("the last sent message is deleted from the channel")]
fn given_last_deleted(world: &mut HeartbeatWorld) {
    delete_last_sent(world);
}

#[when("the last sent message is deleted from the channel")]
fn when_last_deleted(world: &mut HeartbeatWorld) {
    delete_last_sent(world);
}

#[given("the notification channel is failing")]
fn channel_failing(world: &mut HeartbeatWorld) {
    world.channel.set_failing(true);
}

#[when("the notification channel recovers")]
fn channel_recovers(world: &mut HeartbeatWorld) {
    world.channel.set_failing(false);
}

#[when("the site is up")]
async fn site_up(world: &mut HeartbeatWorld) {
    world.site.respond_with(200);
    poll(world).await;
}

#[when(expr = "the site is up for {int} more polls")]
async fn site_up_for(world: &mut HeartbeatWorld, polls: u32) {
    world.site.respond_with(200);
    for _ in 0..polls {
        poll(world).await;
    }
}

#[when(expr = "the site responds with status {int}")]
async fn site_responds(world: &mut HeartbeatWorld, status: u16) {
    world.site.respond_with(status);
    poll(world).await;
}

#[when("the site does not respond")]
async fn site_offline(world: &mut HeartbeatWorld) {
    world.site.go_offline();
    poll(world).await;
}

#[then(expr = "{int} new message(s) should have been sent")]
fn new_messages(world: &mut HeartbeatWorld, expected: usize) {
    assert_eq!(
        world.channel.sent_count() - world.sent_baseline,
        expected,
        "unexpected number of sends: {:?}",
        world.channel.sent()
    );
}

#[then("no new message should have been sent")]
fn no_new_messages(world: &mut HeartbeatWorld) {
    assert_eq!(world.channel.sent_count(), world.sent_baseline);
}

#[then(expr = "the last message title should be {string}")]
fn last_title(world: &mut HeartbeatWorld, expected: String) {
    let (_, notification) = world.channel.last_sent().expect("nothing was sent");
    assert_eq!(notification.title, expected);
}

#[then(expr = "the last message description should be {string}")]
fn last_description(world: &mut HeartbeatWorld, expected: String) {
    let (_, notification) = world.channel.last_sent().expect("nothing was sent");
    assert_eq!(notification.description, expected);
}

#[then(expr = "every message should use the accent color {string}")]
fn accent_color(world: &mut HeartbeatWorld, expected: String) {
    for (_, notification) in world.channel.sent() {
        assert_eq!(notification.color, expected);
    }
}

#[then("the store should hold the last sent message id")]
async fn store_holds_last(world: &mut HeartbeatWorld) {
    let (id, _) = world.channel.last_sent().expect("nothing was sent");
    assert_eq!(world.stored_id().await, Some(id));
}

#[then("the store should be empty")]
async fn store_empty(world: &mut HeartbeatWorld) {
    assert_eq!(world.stored_id().await, None);
}

#[then("the store should not have been written")]
async fn store_untouched(world: &mut HeartbeatWorld) {
    let writes = world.store().await.writes();
    assert_eq!(writes.len(), world.writes_baseline, "{:?}", writes);
}

#[then("the store should have cleared the old id before storing the new one")]
async fn store_replaced(world: &mut HeartbeatWorld) {
    let (id, _) = world.channel.last_sent().expect("nothing was sent");
    let writes = world.store().await.writes();
    assert_eq!(
        writes[world.writes_baseline..].to_vec(),
        vec![StoreWrite::Clear, StoreWrite::Set(id)]
    );
}
