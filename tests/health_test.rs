//! Health check loop behaviour.
//!
//! Most tests run on a paused clock with scripted probes; the last one runs
//! the TCP probe against real listeners.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use rrdialer::health::{check_fn, tcp_check, CheckFn, HealthState};
use rrdialer::{Dialer, Ejection, Options, ProbeError};

mod common;

/// Probe that fails for every address in `down` and counts calls per address.
fn scripted_check(down: Arc<Mutex<HashSet<String>>>, probes: Arc<Mutex<Vec<String>>>) -> CheckFn {
    check_fn(move |_cancel, addr| {
        let down = down.clone();
        let probes = probes.clone();
        async move {
            probes.lock().unwrap().push(addr.clone());
            if down.lock().unwrap().contains(&addr) {
                return Err(ProbeError::Failed("connection refused".to_string()));
            }
            Ok(())
        }
    })
}

fn picks(dialer: &Dialer, n: usize) -> Vec<String> {
    (0..n).map(|_| dialer.address().unwrap()).collect()
}

fn probes_of(probes: &Mutex<Vec<String>>, addr: &str) -> usize {
    probes.lock().unwrap().iter().filter(|a| *a == addr).count()
}

#[tokio::test(start_paused = true)]
async fn test_check_driven_eject_and_recover() {
    let down = Arc::new(Mutex::new(HashSet::from(["a:1".to_string()])));
    let probes = Arc::new(Mutex::new(Vec::new()));
    let logger = common::RecordingLogger::new();

    let options = Options::new()
        .check(scripted_check(down.clone(), probes.clone()))
        .threshold(2)
        .check_interval(Duration::from_secs(1))
        .logger(logger.clone());
    let dialer = Dialer::new(&CancellationToken::new(), ["a:1", "b:2"], options).unwrap();

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(dialer.upstreams()[0].state, HealthState::Degraded { failures: 1 });
    assert!(picks(&dialer, 4).contains(&"a:1".to_string()));

    sleep(Duration::from_secs(1)).await;
    assert_eq!(dialer.upstreams()[0].state, HealthState::Ejected);
    assert!(picks(&dialer, 10).iter().all(|a| a == "b:2"));

    // Probing continues while ejected.
    sleep(Duration::from_secs(2)).await;
    assert_eq!(dialer.upstreams()[0].state, HealthState::Ejected);
    assert_eq!(logger.count_for("ejected", "a:1"), 1);

    down.lock().unwrap().clear();
    sleep(Duration::from_secs(1)).await;
    let status = &dialer.upstreams()[0];
    assert_eq!(status.state, HealthState::Healthy);
    assert_eq!(status.failures, 0);
    assert!(picks(&dialer, 2).contains(&"a:1".to_string()));
    assert_eq!(logger.count_for("recovered", "a:1"), 1);

    // Further successes are no-ops.
    sleep(Duration::from_secs(3)).await;
    assert_eq!(logger.count("recovered"), 1);
    assert_eq!(logger.count("ejected"), 1);
    assert_eq!(logger.count("recovered") + logger.count("ejected"), logger.lines().len());
}

#[tokio::test(start_paused = true)]
async fn test_check_timeout_is_failure() {
    let logger = common::RecordingLogger::new();
    let hang = check_fn(|_cancel, _addr| async {
        std::future::pending::<()>().await;
        Ok(())
    });

    let options = Options::new()
        .check(hang)
        .threshold(2)
        .check_interval(Duration::from_secs(1))
        .check_timeout(Duration::from_millis(300))
        .logger(logger.clone());
    let dialer = Dialer::new(&CancellationToken::new(), ["a:1"], options).unwrap();

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(dialer.upstreams()[0].failures, 1);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(dialer.upstreams()[0].state, HealthState::Ejected);
    assert!(dialer.pick().unwrap_err().is_unavailable());
    assert!(logger.lines()[0].contains("timed out"), "{:?}", logger.lines());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_check_is_not_a_failure() {
    let logger = common::RecordingLogger::new();
    let started = Arc::new(AtomicUsize::new(0));
    let counter = started.clone();
    let check = check_fn(move |cancel: CancellationToken, _addr| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            cancel.cancelled().await;
            Err(ProbeError::Failed("interrupted".to_string()))
        }
    });

    let root = CancellationToken::new();
    let options = Options::new()
        .check(check)
        .threshold(1)
        .check_interval(Duration::from_secs(1))
        .check_timeout(Duration::from_secs(5))
        .logger(logger.clone());
    let dialer = Dialer::new(&root, ["a:1", "b:2"], options).unwrap();

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(started.load(Ordering::SeqCst), 2);

    root.cancel();
    sleep(Duration::from_millis(100)).await;

    for status in dialer.upstreams() {
        assert_eq!(status.failures, 0);
        assert_eq!(status.state, HealthState::Healthy);
    }
    assert!(logger.lines().is_empty());
    assert_eq!(dialer.active_monitors(), 0);
    assert!(dialer.is_shut_down());
}

#[tokio::test(start_paused = true)]
async fn test_time_bounded_policy_with_check() {
    let down = Arc::new(Mutex::new(HashSet::from(["a:1".to_string()])));
    let probes = Arc::new(Mutex::new(Vec::new()));
    let logger = common::RecordingLogger::new();

    let options = Options::new()
        .check(scripted_check(down.clone(), probes.clone()))
        .ejection(Ejection::TimeBounded { cooldown: Duration::from_millis(10_500) })
        .threshold(1)
        .check_interval(Duration::from_secs(1))
        .logger(logger.clone());
    let dialer = Dialer::new(&CancellationToken::new(), ["a:1", "b:2"], options).unwrap();

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(dialer.upstreams()[0].state, HealthState::Ejected);

    // No probes while the cooldown runs.
    down.lock().unwrap().clear();
    sleep(Duration::from_millis(9700)).await;
    assert_eq!(probes_of(&probes, "a:1"), 1);
    assert_eq!(dialer.upstreams()[0].state, HealthState::Ejected);

    // Cooldown expires at 11.5s.
    sleep(Duration::from_millis(500)).await;
    assert!(dialer.upstreams()[0].state.is_eligible());
    assert_eq!(probes_of(&probes, "a:1"), 1);
    assert_eq!(logger.count_for("recovered", "a:1"), 1);

    // Next check succeeds without logging a second recovery.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(probes_of(&probes, "a:1"), 2);
    assert_eq!(dialer.upstreams()[0].state, HealthState::Healthy);
    assert_eq!(logger.count_for("recovered", "a:1"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_expiry_restarts_failure_count() {
    let down = Arc::new(Mutex::new(HashSet::from(["a:1".to_string()])));
    let probes = Arc::new(Mutex::new(Vec::new()));
    let logger = common::RecordingLogger::new();

    let options = Options::new()
        .check(scripted_check(down.clone(), probes.clone()))
        .ejection(Ejection::TimeBounded { cooldown: Duration::from_millis(2500) })
        .threshold(2)
        .check_interval(Duration::from_secs(1))
        .logger(logger.clone());
    let dialer = Dialer::new(&CancellationToken::new(), ["a:1", "b:2"], options).unwrap();

    // Failed probes at 1s and 2s eject it until 4.5s.
    sleep(Duration::from_millis(2300)).await;
    assert_eq!(dialer.upstreams()[0].state, HealthState::Ejected);

    sleep(Duration::from_millis(2500)).await;
    let status = &dialer.upstreams()[0];
    assert_eq!(status.state, HealthState::Healthy);
    assert_eq!(status.failures, 0);
    assert_eq!(logger.count_for("recovered", "a:1"), 1);

    // A single failure at 5s only degrades it.
    sleep(Duration::from_millis(500)).await;
    assert_eq!(dialer.upstreams()[0].state, HealthState::Degraded { failures: 1 });
    assert!(picks(&dialer, 4).contains(&"a:1".to_string()));
    assert_eq!(logger.count_for("ejected", "a:1"), 1);

    // The second consecutive failure at 6s ejects it again.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(dialer.upstreams()[0].state, HealthState::Ejected);
    assert_eq!(logger.count_for("ejected", "a:1"), 2);

    // Cooldown ends at 8.5s; the successful check at 9s stays quiet.
    down.lock().unwrap().clear();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(dialer.upstreams()[0].state, HealthState::Healthy);
    assert_eq!(probes_of(&probes, "a:1"), 7);
    assert_eq!(logger.count_for("recovered", "a:1"), 2);
    assert_eq!(logger.lines().len(), 4, "{:?}", logger.lines());
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_monitors() {
    let probes = Arc::new(Mutex::new(Vec::new()));
    let options = Options::new()
        .check(scripted_check(Arc::default(), probes.clone()))
        .check_interval(Duration::from_secs(1))
        .logger(Arc::new(rrdialer::observability::NoopLogger));
    let dialer = Dialer::new(&CancellationToken::new(), ["a:1", "b:2"], options).unwrap();

    sleep(Duration::from_millis(2500)).await;
    assert_eq!(probes.lock().unwrap().len(), 4);

    drop(dialer);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(probes.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn test_tcp_check_ejects_and_restores() {
    let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let first_addr = first.local_addr().unwrap().to_string();
    // Two successful probes, then the listener goes away.
    common::serve_hello(first, 0, 2);
    let second_addr = common::start_hello_backend(1, 9999).await;

    let logger = common::RecordingLogger::new();
    let options = Options::new()
        .check(tcp_check())
        .threshold(2)
        .check_interval(Duration::from_secs(1))
        .check_timeout(Duration::from_secs(1))
        .logger(logger.clone());
    let dialer = Dialer::new(
        &CancellationToken::new(),
        [first_addr.clone(), second_addr.clone()],
        options,
    )
    .unwrap();

    // Probes at 1s and 2s succeed, 3s and 4s fail.
    sleep(Duration::from_millis(4600)).await;
    assert_eq!(dialer.upstreams()[0].state, HealthState::Ejected);
    assert!(picks(&dialer, 10).iter().all(|a| *a == second_addr));
    assert_eq!(logger.count_for("ejected", &first_addr), 1);

    // Accepting again: the next probe restores it.
    let again = TcpListener::bind(&first_addr).await.unwrap();
    common::serve_hello(again, 0, 9999);
    sleep(Duration::from_millis(1900)).await;

    assert_eq!(dialer.upstreams()[0].state, HealthState::Healthy);
    assert!(picks(&dialer, 2).contains(&first_addr));
    assert_eq!(logger.count_for("recovered", &first_addr), 1);
}
