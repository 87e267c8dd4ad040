//! Countdown timer that ticks remaining time until expiry or stop

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use serde::Serialize;
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

use super::duration::DisplayDuration;
use crate::error::{EngineError, Result};

/// Default interval between ticks
pub const DEFAULT_GRANULARITY: Duration = Duration::from_millis(1000);

const MIN_GRANULARITY: Duration = Duration::from_millis(1);

/// Lifecycle of a countdown timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Idle,
    Running,
    Expired,
    Stopped,
}

/// Remaining time delivered to tick subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub remaining: u64,
    pub display: DisplayDuration,
}

impl Tick {
    fn new(remaining: u64) -> Self {
        Self {
            remaining,
            display: DisplayDuration::from_secs(remaining),
        }
    }

    /// The zero tick that ends a run
    pub fn is_final(&self) -> bool {
        self.remaining == 0
    }
}

/// Tick subscriber. Runs while the timer is locked, so it must not call
/// back into the timer.
pub type TickCallback = Box<dyn FnMut(&Tick) + Send>;

/// Expiry subscriber, invoked once after the final zero tick
pub type ExpiryCallback = Box<dyn FnOnce() + Send>;

struct Shared {
    status: TimerStatus,
    /// Incremented on every start so ticks from an earlier run are dropped
    run: u64,
    tick_subscribers: Vec<TickCallback>,
    expiry_subscribers: Vec<ExpiryCallback>,
    task: Option<JoinHandle<()>>,
}

fn lock_shared(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Counts a fixed duration down to zero, notifying subscribers on every tick.
///
/// Remaining time is recomputed from the elapsed time since `start()` on each
/// tick, so late or skipped ticks do not accumulate drift.
pub struct CountdownTimer {
    duration: u64,
    granularity: Duration,
    shared: Arc<Mutex<Shared>>,
}

impl CountdownTimer {
    /// Create an idle timer ticking once per second
    pub fn new(duration: u64) -> Self {
        Self::with_granularity(duration, DEFAULT_GRANULARITY)
    }

    /// Create an idle timer with a custom tick interval
    pub fn with_granularity(duration: u64, granularity: Duration) -> Self {
        Self {
            duration,
            granularity: granularity.max(MIN_GRANULARITY),
            shared: Arc::new(Mutex::new(Shared {
                status: TimerStatus::Idle,
                run: 0,
                tick_subscribers: Vec::new(),
                expiry_subscribers: Vec::new(),
                task: None,
            })),
        }
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn granularity(&self) -> Duration {
        self.granularity
    }

    pub fn status(&self) -> TimerStatus {
        lock_shared(&self.shared).status
    }

    pub fn is_running(&self) -> bool {
        self.status() == TimerStatus::Running
    }

    /// True once the timer is no longer counting
    pub fn expired(&self) -> bool {
        !self.is_running()
    }

    /// Register a tick subscriber; subscribers run in registration order
    pub fn on_tick<F>(&self, callback: F) -> &Self
    where
        F: FnMut(&Tick) + Send + 'static,
    {
        lock_shared(&self.shared).tick_subscribers.push(Box::new(callback));
        self
    }

    /// Register a subscriber for natural expiry
    pub fn on_expire<F>(&self, callback: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        lock_shared(&self.shared).expiry_subscribers.push(Box::new(callback));
        self
    }

    /// Start counting down. The first tick arrives one granularity later.
    pub fn start(&self) -> Result<()> {
        let mut shared = lock_shared(&self.shared);
        if shared.status == TimerStatus::Running {
            return Err(EngineError::AlreadyRunning);
        }

        shared.status = TimerStatus::Running;
        shared.run += 1;
        let started = Instant::now();

        debug!(
            "Starting countdown of {}s (run {}, granularity {:?})",
            self.duration, shared.run, self.granularity
        );

        shared.task = Some(tokio::spawn(run_countdown(
            Arc::clone(&self.shared),
            shared.run,
            self.duration,
            self.granularity,
            started,
        )));
        Ok(())
    }

    /// Stop a running timer. No subscriber is invoked once this returns.
    /// Calling it on a timer that is not running does nothing.
    pub fn stop(&self) {
        let mut shared = lock_shared(&self.shared);
        if shared.status != TimerStatus::Running {
            return;
        }

        shared.status = TimerStatus::Stopped;
        shared.tick_subscribers.clear();
        shared.expiry_subscribers.clear();
        if let Some(task) = shared.task.take() {
            task.abort();
        }
        debug!("Countdown stopped (run {})", shared.run);
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownTimer")
            .field("duration", &self.duration)
            .field("granularity", &self.granularity)
            .field("status", &self.status())
            .finish()
    }
}

async fn run_countdown(
    shared: Arc<Mutex<Shared>>,
    run: u64,
    duration: u64,
    granularity: Duration,
    started: Instant,
) {
    let mut interval = time::interval_at(started + granularity, granularity);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let remaining = duration.saturating_sub(started.elapsed().as_secs());
        if !deliver_tick(&shared, run, remaining) {
            break;
        }
    }
}

/// Deliver one tick; returns whether the countdown keeps going
fn deliver_tick(shared: &Mutex<Shared>, run: u64, remaining: u64) -> bool {
    let mut guard = lock_shared(shared);
    if guard.run != run || guard.status != TimerStatus::Running {
        return false;
    }

    let tick = Tick::new(remaining);
    for callback in guard.tick_subscribers.iter_mut() {
        callback(&tick);
    }

    if !tick.is_final() {
        return true;
    }

    guard.status = TimerStatus::Expired;
    guard.task = None;
    guard.tick_subscribers.clear();
    let expiry = std::mem::take(&mut guard.expiry_subscribers);
    drop(guard);

    debug!("Countdown expired (run {})", run);
    for callback in expiry {
        callback();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn recorder(timer: &CountdownTimer) -> Arc<Mutex<Vec<u64>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        timer.on_tick(move |tick| sink.lock().unwrap().push(tick.remaining));
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_to_zero_then_expires() {
        let timer = CountdownTimer::new(2);
        let seen = recorder(&timer);

        timer.start().unwrap();
        assert!(timer.is_running());

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 0]);
        assert_eq!(timer.status(), TimerStatus::Expired);
        assert!(timer.expired());

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_delivery_immediately() {
        let timer = CountdownTimer::new(10);
        let seen = recorder(&timer);

        timer.start().unwrap();
        time::sleep(Duration::from_millis(2500)).await;
        timer.stop();
        assert_eq!(timer.status(), TimerStatus::Stopped);

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(*seen.lock().unwrap(), vec![9, 8]);

        // Second stop is a no-op
        timer.stop();
        assert_eq!(timer.status(), TimerStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_suppresses_expiry_subscribers() {
        let timer = CountdownTimer::new(1);
        let expired = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&expired);
        timer.on_expire(move || *flag.lock().unwrap() = true);

        timer.start().unwrap();
        timer.stop();
        time::sleep(Duration::from_secs(3)).await;
        assert!(!*expired.lock().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_while_running_is_rejected() {
        let timer = CountdownTimer::new(5);
        timer.start().unwrap();
        assert!(matches!(timer.start(), Err(EngineError::AlreadyRunning)));
        timer.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_run_in_registration_order_then_expiry() {
        let timer = CountdownTimer::new(1);
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&log);
        let second = Arc::clone(&log);
        let third = Arc::clone(&log);
        timer
            .on_tick(move |tick| first.lock().unwrap().push(format!("a{}", tick.remaining)))
            .on_tick(move |tick| second.lock().unwrap().push(format!("b{}", tick.display)));
        timer.on_expire(move || third.lock().unwrap().push("expired".to_string()));

        timer.start().unwrap();
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*log.lock().unwrap(), vec!["a0", "b00s", "expired"]);
    }

    #[tokio::test(start_paused = true)]
    async fn sub_second_granularity_repeats_whole_seconds() {
        let timer = CountdownTimer::with_granularity(2, Duration::from_millis(500));
        let seen = recorder(&timer);

        timer.start().unwrap();
        time::sleep(Duration::from_secs(4)).await;
        assert_eq!(*seen.lock().unwrap(), vec![2, 1, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn late_ticks_are_recomputed_from_elapsed_time() {
        let timer = CountdownTimer::new(10);
        let seen = recorder(&timer);

        timer.start().unwrap();
        time::advance(Duration::from_secs(4)).await;
        time::sleep(Duration::from_millis(10)).await;

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|remaining| *remaining == 6), "ticks: {:?}", *seen);
        drop(seen);
        timer.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_running_timer_stops_it() {
        let timer = CountdownTimer::new(3);
        let seen = recorder(&timer);
        timer.start().unwrap();
        drop(timer);

        time::sleep(Duration::from_secs(5)).await;
        assert!(seen.lock().unwrap().is_empty());
    }
}
