//! Integration tests for the complete mining flow

use assert_matches::assert_matches;
use header_mine_sim::{
    BlockHeader, ChannelPollControl, ChannelSink, DisplayHash, Error, FixedClock, HashAlgorithm,
    HeaderBuffer, MemorySink, MineScheduler, MiningEvent, PollSignal, SchedulerConfig,
    SchedulerState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const T: u32 = 1_700_000_000;
const TIP: &str = "00000000000000000002a7c4c1e48d76c5a37902165a270156b7a8d72728a054";

fn config(follow_tip: bool) -> SchedulerConfig {
    SchedulerConfig {
        tick_period: Duration::from_millis(100),
        algorithm: HashAlgorithm::Sha256,
        follow_tip,
    }
}

fn zero_nonce_genesis() -> HeaderBuffer {
    HeaderBuffer::from_header(&BlockHeader {
        nonce: 0,
        ..BlockHeader::genesis()
    })
}

#[tokio::test(start_paused = true)]
async fn test_follow_tip_session() {
    let (sink, mut events) = ChannelSink::new();
    let (poll, mut signals) = ChannelPollControl::new();
    let scheduler = MineScheduler::spawn_with(
        zero_nonce_genesis(),
        config(true),
        Arc::new(sink),
        Arc::new(FixedClock::new(T)),
        Arc::new(poll),
    );

    // Loading a header in follow-tip mode starts mining and polling
    scheduler.load_header(BlockHeader::genesis()).unwrap();
    assert_eq!(signals.recv().await, Some(PollSignal::Start));

    let first = events.recv().await.unwrap();
    assert_eq!(first.nonce, 2_083_236_894);

    // A poller on another task delivers a new tip
    let follower = scheduler.tip_follower();
    tokio::spawn(async move { follower.on_new_tip_hex(TIP).unwrap() })
        .await
        .unwrap();

    let second = events.recv().await.unwrap();
    let header = HeaderBuffer::from_bytes(&second.header_bytes().unwrap()).unwrap();
    let tip: DisplayHash = TIP.parse().unwrap();
    assert_eq!(header.previous_hash(), tip.to_wire_order());
    assert_eq!(header.to_header().previous_hash, tip);

    scheduler.stop().unwrap();
    assert_eq!(signals.recv().await, Some(PollSignal::Pause));

    // Exactly one more cycle, then nothing
    let last = events.recv().await.unwrap();
    assert_eq!(last.nonce, second.nonce + 1);
    sleep(Duration::from_secs(1)).await;
    assert!(events.try_recv().is_err());

    let snapshot = scheduler.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SchedulerState::Stopped);

    let header = scheduler.shutdown().await.unwrap();
    assert_eq!(header.nonce(), last.nonce);
}

#[tokio::test(start_paused = true)]
async fn test_independent_schedulers_do_not_share_state() {
    let a_sink = MemorySink::new();
    let b_sink = MemorySink::new();
    let a = MineScheduler::spawn(zero_nonce_genesis(), config(false), a_sink.clone());
    let b = MineScheduler::spawn(zero_nonce_genesis(), config(false), b_sink.clone());

    a.start().unwrap();
    b.step_once().unwrap();
    sleep(Duration::from_millis(350)).await;

    assert_eq!(a_sink.len(), 3);
    assert_eq!(b_sink.len(), 1);
    assert_eq!(b.snapshot().await.unwrap().header.nonce(), 1);
    assert_eq!(a.snapshot().await.unwrap().header.nonce(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_events_match_recomputed_digest() {
    let recorded = Arc::new(parking_lot::Mutex::new(Vec::<MiningEvent>::new()));
    let sink = {
        let recorded = Arc::clone(&recorded);
        move |event: &MiningEvent| recorded.lock().push(event.clone())
    };
    let scheduler = MineScheduler::spawn(zero_nonce_genesis(), config(false), sink);

    for _ in 0..5 {
        scheduler.step_once().unwrap();
    }
    scheduler.snapshot().await.unwrap();

    let digest = header_mine_sim::DoubleDigest::default();
    for event in recorded.lock().iter() {
        let bytes = event.header_bytes().unwrap();
        assert_eq!(bytes.len(), 80);
        assert_eq!(event.digest, header_mine_sim::to_display_order(digest.digest(&bytes)));
    }
}

#[tokio::test(start_paused = true)]
async fn test_commands_after_shutdown_are_misuse() {
    let scheduler = MineScheduler::spawn(zero_nonce_genesis(), config(false), MemorySink::new());
    let follower = scheduler.tip_follower();
    scheduler.shutdown().await.unwrap();

    assert_matches!(follower.on_new_tip_hex(TIP), Err(Error::Misuse { .. }));
}
