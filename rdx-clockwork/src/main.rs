use anyhow::Result;
use clockwork::prelude::*;
use clockwork::{LIBRARY_NAME, VERSION};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    info!("{} v{} dev driver", LIBRARY_NAME, VERSION);

    // 2. Exercise the ClockTime value type.
    demo_clock_time()?;

    // 3. Exercise pipeline composition.
    demo_pipelines().await?;

    // 4. Exercise the registry and the scheduling helpers.
    demo_registry();
    demo_scheduling().await;

    Ok(())
}

/// Shows construction, arithmetic, and the string forms of `ClockTime`.
fn demo_clock_time() -> Result<()> {
    let now = ClockTime::now();
    info!("[TIME] now is {} ({})", now, now.to_iso_string());

    let meeting: ClockTime = "09:30".parse()?;
    let wrapped = meeting.add_hours(-10);
    info!(
        "[TIME] {} minus 10h wraps to {} (canonical {} ms)",
        meeting,
        wrapped,
        wrapped.total_millis()
    );

    if meeting.is_before(&now) {
        info!("[TIME] the 09:30 meeting already started");
    }
    Ok(())
}

/// Shows chain, parallel, retry, and error-handler composition.
async fn demo_pipelines() -> Result<()> {
    // --- A plain chain with a recovering error handler ---
    let mut chain = Sequence::new()
        .then(|x: i64| async move { Ok(x + 1) })
        .then(|x: i64| async move { Ok(x * 2) })
        .error(|_| Ok(0));
    let value = chain.execute(3).await.map_err(|e| anyhow::anyhow!(e))?;
    info!("[SEQUENCE] chain(3) => {} (cached: {:?})", value, chain.result());

    // --- Parallel join: results arrive in input order ---
    let mut gather = Sequence::parallel(vec![
        source(|| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok("slow".to_string())
        }),
        source(|| async { Ok("fast".to_string()) }),
    ]);
    let joined = gather
        .execute(Vec::new())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    info!("[SEQUENCE] parallel => {:?}", joined);

    // --- Retry: flaky source succeeds on the third attempt ---
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let mut flaky = Sequence::retry(
        3,
        source(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(format!("attempt {n} failed").into())
                } else {
                    Ok(n)
                }
            }
        }),
        Duration::from_millis(10),
    );
    let n = flaky.execute(0).await.map_err(|e| anyhow::anyhow!(e))?;
    info!("[SEQUENCE] retry succeeded on attempt {}", n);
    Ok(())
}

/// Shows unique token issuing through an owned registry.
fn demo_registry() {
    let mut registry = IdRegistry::new("widget");
    let first = registry.issue();
    let second = registry.issue();
    info!(
        "[REGISTRY] issued {:?} and {:?}",
        registry.label(first),
        registry.label(second)
    );
    registry.release(first);
    info!("[REGISTRY] {} token(s) still held", registry.len());
}

/// Shows the deferred one-shot and the stoppable ticker.
async fn demo_scheduling() {
    let deferred = defer(Duration::from_millis(50), || async {
        info!("[SCHEDULE] deferred task fired");
    });

    let ticks = Arc::new(AtomicU32::new(0));
    let counter = ticks.clone();
    let ticker = Ticker::spawn(Duration::from_millis(100), move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        info!("[SCHEDULE] tick #{n}");
    });

    tokio::time::sleep(Duration::from_millis(550)).await;
    ticker.join().await;
    deferred.await.ok();
    info!("[SCHEDULE] ticker stopped after {} ticks", ticks.load(Ordering::SeqCst));
}
