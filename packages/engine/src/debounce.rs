//! Quiet-period debouncing of input changes.
//!
//! [`Debouncer`] holds at most one pending value. Every [`Debouncer::push`]
//! replaces it and restarts the quiet period, so intermediate values are
//! dropped rather than queued. [`Debouncer::settled`] resolves with the
//! latest value once no push has happened for a full quiet period.
//!
//! `settled()` is cancel-safe and is meant to be polled as one branch of a
//! `tokio::select!` loop alongside the sources that call `push()`.

use std::time::Duration;

use tokio::time::Instant;

struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Emits the latest pushed value after a quiet period.
pub struct Debouncer<T> {
    quiet_period: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    /// Creates a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    /// The configured quiet period.
    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Replaces the pending value and restarts the quiet period.
    pub fn push(&mut self, value: T) {
        let deadline = Instant::now() + self.quiet_period;
        if self.pending.replace(Pending { value, deadline }).is_some() {
            log::trace!("Debounce: superseded pending input");
        }
    }

    /// Drops the pending value, if any, and returns it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    /// Whether a value is waiting for its quiet period to elapse.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value will settle, if there is one.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Waits for the pending value to settle and returns it.
    ///
    /// Never resolves while nothing is pending. Dropping the future before
    /// it resolves leaves the pending value in place.
    pub async fn settled(&mut self) -> T {
        let Some(deadline) = self.deadline() else {
            return std::future::pending().await;
        };

        tokio::time::sleep_until(deadline).await;

        match self.pending.take() {
            Some(p) => p.value,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(300);
    const STEP: Duration = Duration::from_millis(50);

    #[tokio::test(start_paused = true)]
    async fn coalesces_rapid_inputs_into_one_emission() {
        let mut debouncer = Debouncer::new(QUIET);

        let start = Instant::now();
        for input in ["B", "Be", "Ber"] {
            debouncer.push(input.to_string());
            tokio::time::sleep(STEP).await;
        }

        let settled = debouncer.settled().await;
        assert_eq!(settled, "Ber");
        // Settles one quiet period after the last push, not the first.
        let elapsed = start.elapsed();
        assert!(elapsed >= STEP * 2 + QUIET, "settled too early: {elapsed:?}");
        assert!(elapsed < STEP * 3 + QUIET, "settled too late: {elapsed:?}");

        let second = tokio::time::timeout(Duration::from_secs(5), debouncer.settled()).await;
        assert!(second.is_err(), "only one emission expected");
    }

    #[tokio::test(start_paused = true)]
    async fn emits_each_value_separated_by_quiet_period() {
        let mut debouncer = Debouncer::new(QUIET);

        debouncer.push("Ber");
        assert_eq!(debouncer.settled().await, "Ber");

        debouncer.push("Bern");
        assert_eq!(debouncer.settled().await, "Bern");
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_value() {
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push("Ber");
        assert_eq!(debouncer.cancel(), Some("Ber"));
        assert!(debouncer.deadline().is_none());

        let result = tokio::time::timeout(QUIET * 4, debouncer.settled()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_settled_future_keeps_pending_value() {
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push("Ber");

        let early = tokio::time::timeout(STEP, debouncer.settled()).await;
        assert!(early.is_err());
        assert!(debouncer.is_pending());

        assert_eq!(debouncer.settled().await, "Ber");
    }

    #[tokio::test(start_paused = true)]
    async fn settled_inside_select_loop() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<&str>();
        let mut debouncer = Debouncer::new(QUIET);
        let mut emitted = Vec::new();

        tokio::spawn(async move {
            for input in ["B", "Be", "Ber"] {
                tx.send(input).unwrap();
                tokio::time::sleep(STEP).await;
            }
            tokio::time::sleep(QUIET * 2).await;
            tx.send("Bern").unwrap();
        });

        loop {
            tokio::select! {
                input = rx.recv() => match input {
                    Some(value) => debouncer.push(value),
                    None if !debouncer.is_pending() => break,
                    None => emitted.push(debouncer.settled().await),
                },
                value = debouncer.settled() => emitted.push(value),
            }
        }

        assert_eq!(emitted, vec!["Ber", "Bern"]);
    }
}
