//! Integration tests combining pipelines, clock values, and scheduling.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clockwork::prelude::*;

// ─────────────────────── helpers ───────────────────────

/// A source that yields a fixed clock value after a short delay.
fn delayed_time(delay: Duration, time: ClockTime) -> Source<ClockTime> {
    source(move || async move {
        tokio::time::sleep(delay).await;
        Ok(time)
    })
}

fn at(h: u32, m: u32) -> ClockTime {
    ClockTime::new(h, m, 0, 0).expect("valid clock fields")
}

// ─────────────────────── pipelines over clock values ───────────────────────

#[tokio::test]
async fn clock_arithmetic_flows_through_a_chain() {
    let mut pipeline = Sequence::new()
        .then(|t: ClockTime| async move { Ok(t.add_minutes(90)) })
        .then(|t: ClockTime| async move { Ok(t.add_hours(-2)) });

    let out = pipeline.execute(at(9, 0)).await.unwrap();
    assert_eq!(out, at(8, 30));
    assert_eq!(pipeline.result(), Some(at(8, 30)));
}

#[tokio::test]
async fn race_of_delayed_clock_sources_picks_the_fastest() {
    let mut race = Sequence::race(vec![
        delayed_time(Duration::from_millis(50), at(1, 0)),
        delayed_time(Duration::from_millis(5), at(2, 0)),
    ]);
    assert_eq!(race.execute(at(0, 0)).await.unwrap(), at(2, 0));
}

#[tokio::test]
async fn parallel_clock_sources_keep_input_order() {
    let mut gather = Sequence::parallel(vec![
        delayed_time(Duration::from_millis(30), at(6, 15)),
        delayed_time(Duration::from_millis(1), at(18, 45)),
    ]);
    let times = gather.execute(Vec::new()).await.unwrap();
    assert_eq!(times, vec![at(6, 15), at(18, 45)]);
}

#[tokio::test]
async fn spliced_pipelines_execute_end_to_end() {
    let normalize: Sequence<ClockTime> = Sequence::new()
        .then(|t: ClockTime| async move { t.with_seconds(0).map_err(Into::into) })
        .then(|t: ClockTime| async move { t.with_millis(0).map_err(Into::into) });

    let mut pipeline = Sequence::of(vec![
        Step::Sequence(normalize),
        Step::Task(task(|t: ClockTime| async move { Ok(t.add_hours(1)) })),
    ]);
    assert_eq!(pipeline.len(), 3);

    let input = ClockTime::new(10, 20, 30, 400).unwrap();
    assert_eq!(pipeline.execute(input).await.unwrap(), at(11, 20));
}

#[tokio::test]
async fn handler_recovers_a_failed_parse_stage() {
    let mut pipeline = Sequence::new()
        .then(|raw: String| async move {
            raw.parse::<ClockTime>()
                .map(|t| t.to_string())
                .map_err(Into::into)
        })
        .error(|_| Ok("00:00:00".to_string()));

    assert_eq!(pipeline.execute("12:34:56".into()).await.unwrap(), "12:34:56");
    assert_eq!(pipeline.execute("garbage".into()).await.unwrap(), "00:00:00");
}

// ─────────────────────── scheduling against pipelines ───────────────────────

#[tokio::test]
async fn deferred_pipeline_run_completes() {
    let handle = defer(Duration::from_millis(10), || async {
        let mut chain = Sequence::new().then(|x: i32| async move { Ok(x * x) });
        chain.execute(7).await
    });
    assert_eq!(handle.await.unwrap().unwrap(), 49);
}

#[tokio::test]
async fn ticker_drives_registry_growth_until_stopped() {
    let issued = Arc::new(AtomicU32::new(0));
    let counter = issued.clone();
    let ticker = Ticker::spawn(Duration::from_millis(10), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    ticker.join().await;

    let fired = issued.load(Ordering::SeqCst);
    assert!(fired >= 3, "expected several ticks, got {fired}");

    let mut registry = IdRegistry::new("tick");
    for _ in 0..fired {
        registry.issue();
    }
    assert_eq!(registry.len(), fired as usize);
}
