use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::quote_cache::{FetchOutcome, QuoteCache};
use crate::types::settings::Settings;

#[derive(Debug, Clone, Copy)]
enum RefreshReason {
    Rekey,
    Restart,
    Scheduled,
}

/// Background refresh loop for a [`QuoteCache`].
///
/// Follows the tracked set and the refresh interval through their watch
/// channels. The timer only runs while the set is non-empty. Dropping the
/// handle stops the loop and any fetch it started.
pub struct RefreshScheduler {
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Must be called from within a tokio runtime.
    pub fn start(
        cache: Arc<QuoteCache>,
        symbols: watch::Receiver<Vec<String>>,
        settings: watch::Receiver<Settings>,
    ) -> Self {
        let handle = tokio::spawn(run(cache, symbols, settings));
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn spawn_refresh(tasks: &mut JoinSet<()>, cache: &Arc<QuoteCache>, reason: RefreshReason) {
    let cache = Arc::clone(cache);
    tasks.spawn(async move {
        match cache.refresh().await {
            FetchOutcome::Failed { message } => {
                warn!(?reason, error = %message, "Quote refresh failed, retrying next tick");
            }
            outcome => debug!(?reason, ?outcome, "Quote refresh finished"),
        }
    });
}

async fn run(
    cache: Arc<QuoteCache>,
    mut symbols: watch::Receiver<Vec<String>>,
    mut settings: watch::Receiver<Settings>,
) {
    let mut tasks = JoinSet::new();
    let mut period = settings.borrow_and_update().refresh_interval();
    let mut next_tick = Instant::now() + period;

    // A restart on an existing cache may find the set already keyed but stale.
    let initial = symbols.borrow_and_update().clone();
    if cache.set_symbols(initial) {
        spawn_refresh(&mut tasks, &cache, RefreshReason::Rekey);
    } else if cache.needs_fetch() {
        spawn_refresh(&mut tasks, &cache, RefreshReason::Restart);
    }
    info!(period_secs = period.as_secs(), "Quote refresh scheduler started");

    loop {
        let active = cache.is_active();
        tokio::select! {
            _ = sleep_until(next_tick), if active => {
                cache.collect_garbage();
                spawn_refresh(&mut tasks, &cache, RefreshReason::Scheduled);
                next_tick = Instant::now() + period;
            }
            changed = settings.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = settings.borrow_and_update().refresh_interval();
                if latest != period {
                    debug!(old_secs = period.as_secs(), new_secs = latest.as_secs(), "Refresh interval changed, rescheduling");
                    period = latest;
                    next_tick = Instant::now() + period;
                }
            }
            changed = symbols.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = symbols.borrow_and_update().clone();
                if cache.set_symbols(next) {
                    spawn_refresh(&mut tasks, &cache, RefreshReason::Rekey);
                }
                next_tick = Instant::now() + period;
            }
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }
    info!("Quote refresh scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote_cache::QuoteStatus;
    use crate::testing::FakeProvider;
    use std::time::Duration;

    struct Harness {
        provider: Arc<FakeProvider>,
        cache: Arc<QuoteCache>,
        symbols: watch::Sender<Vec<String>>,
        settings: watch::Sender<Settings>,
    }

    fn harness(initial: &[&str]) -> Harness {
        let provider = Arc::new(FakeProvider::new());
        let (settings, settings_rx) = watch::channel(Settings::default());
        let (symbols, _) = watch::channel(initial.iter().map(|s| s.to_string()).collect());
        let cache = Arc::new(QuoteCache::new(provider.clone(), settings_rx));
        Harness {
            provider,
            cache,
            symbols,
            settings,
        }
    }

    impl Harness {
        fn start(&self) -> RefreshScheduler {
            RefreshScheduler::start(
                self.cache.clone(),
                self.symbols.subscribe(),
                self.settings.subscribe(),
            )
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_immediately_then_every_interval() {
        let h = harness(&["AAPL"]);
        let _scheduler = h.start();
        settle().await;
        assert_eq!(h.provider.fetch_count(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.provider.fetch_count(), 2);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.provider.fetch_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_set_never_fetches() {
        let h = harness(&[]);
        let _scheduler = h.start();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(h.provider.fetch_count(), 0);
        assert_eq!(h.cache.view().status, QuoteStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn emptying_the_set_cancels_the_timer() {
        let h = harness(&["AAPL"]);
        let _scheduler = h.start();
        settle().await;
        h.symbols.send_replace(Vec::new());
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(h.provider.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn adding_a_symbol_rekeys_and_fetches() {
        let h = harness(&[]);
        let _scheduler = h.start();
        settle().await;
        h.symbols.send_replace(vec!["MSFT".to_string()]);
        settle().await;
        assert_eq!(h.provider.fetches(), vec![vec!["MSFT".to_string()]]);
        assert_eq!(h.cache.view().status, QuoteStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_applies_to_next_refresh() {
        let h = harness(&["AAPL"]);
        let _scheduler = h.start();
        settle().await;
        assert_eq!(h.provider.fetch_count(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        h.settings.send_modify(|s| s.refresh_interval_seconds = 5);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(h.provider.fetch_count(), 2);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.provider.fetch_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_settings_change_keeps_schedule() {
        let h = harness(&["AAPL"]);
        let _scheduler = h.start();
        settle().await;
        tokio::time::sleep(Duration::from_secs(20)).await;
        h.settings.send_modify(|s| s.cache_gc_time_minutes = 30);
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(h.provider.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_does_not_reset_schedule() {
        let h = harness(&["AAPL"]);
        let _scheduler = h.start();
        settle().await;

        tokio::time::sleep(Duration::from_secs(20)).await;
        h.cache.refresh().await;
        assert_eq!(h.provider.fetch_count(), 2);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(h.provider.fetch_count(), 3);
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(h.provider.fetch_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_retried_on_next_tick() {
        let h = harness(&["AAPL"]);
        h.provider.set_failing(true);
        let _scheduler = h.start();
        settle().await;
        assert!(matches!(h.cache.view().status, QuoteStatus::Error { .. }));

        h.provider.set_failing(false);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.provider.fetch_count(), 2);
        assert_eq!(h.cache.view().status, QuoteStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_scheduler_stops_refreshes() {
        let h = harness(&["AAPL"]);
        let scheduler = h.start();
        settle().await;
        assert!(scheduler.is_running());
        drop(scheduler);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(h.provider.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_mid_fetch_clears_fetching() {
        let h = harness(&["AAPL"]);
        h.provider.set_delay(&["AAPL"], Duration::from_secs(5));
        let scheduler = h.start();
        settle().await;
        assert!(h.cache.view().fetching);

        drop(scheduler);
        settle().await;
        assert!(!h.cache.view().fetching);
        assert!(h.cache.needs_fetch());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_refetches_only_a_stale_set() {
        let h = harness(&["AAPL"]);
        let first = h.start();
        settle().await;
        drop(first);
        assert_eq!(h.provider.fetch_count(), 1);

        let second = h.start();
        settle().await;
        drop(second);
        assert_eq!(h.provider.fetch_count(), 1);

        tokio::time::advance(Duration::from_secs(6 * 60)).await;
        let _scheduler = h.start();
        settle().await;
        assert_eq!(h.provider.fetch_count(), 2);
    }
}
