//! QPS rate limiting with static and ramped targets.
//!
//! A [`RateLimiter`] is constructed once from validated configuration
//! before any worker starts, then shared by every worker. Admission and
//! ramp adjustment are gated by a single mutex so no caller can observe a
//! stale QPS target concurrently with a ramp update.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

/// How the QPS target moves between the ramp endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RampMode {
    /// Add a fixed signed delta per interval.
    Linear { change: i32 },
    /// Multiply by a fixed factor per interval.
    Exponential { factor: f64 },
}

/// Aggregate operation-rate limit for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLimit {
    /// No limit; every call is admitted immediately.
    Unconstrained,
    /// A fixed QPS target for the whole run.
    Static { qps: u32 },
    /// A target that moves from `start` to `end`, adjusted every
    /// `interval`, then holds at `end`.
    Ramp {
        start: u32,
        end: u32,
        interval: Duration,
        mode: RampMode,
    },
}

/// Mutable limiter state, all behind one mutex.
#[derive(Debug)]
struct LimiterState {
    /// Current effective QPS target.
    current_qps: u32,
    /// When the ramp was last adjusted.
    last_ramp: Instant,
    /// Operations admitted in the current one-second window.
    ops_in_window: u32,
    /// Start of the current one-second window.
    window_start: Instant,
}

/// Blocking admission control shared by all workers.
pub struct RateLimiter {
    limit: RateLimit,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Build a limiter from a validated [`RateLimit`].
    pub fn new(limit: RateLimit) -> Self {
        let now = Instant::now();
        let current_qps = match limit {
            RateLimit::Unconstrained => 0,
            RateLimit::Static { qps } => qps,
            RateLimit::Ramp { start, .. } => start,
        };
        Self {
            limit,
            state: Mutex::new(LimiterState {
                current_qps,
                last_ramp: now,
                ops_in_window: 0,
                window_start: now,
            }),
        }
    }

    /// The current effective QPS target (0 when unconstrained).
    pub fn current_qps(&self) -> u32 {
        self.state.lock().expect("limiter state poisoned").current_qps
    }

    /// Admit one operation, blocking until the current window permits it.
    ///
    /// The blocked caller sleeps holding the limiter mutex, so all other
    /// throttled workers queue behind it and are released together at the
    /// window boundary. This reproduces the window-reset behavior of the
    /// original tool: the window restarts relative to the observed clock
    /// rather than a fixed schedule, which yields a micro-burst of
    /// admissions at each second edge.
    pub fn throttle(&self) {
        if self.limit == RateLimit::Unconstrained {
            return;
        }

        let mut state = self.state.lock().expect("limiter state poisoned");
        let now = Instant::now();

        if let RateLimit::Ramp {
            start,
            end,
            interval,
            mode,
        } = self.limit
        {
            if now.duration_since(state.last_ramp) >= interval {
                let next = next_qps(state.current_qps, start, end, mode);
                if next != state.current_qps {
                    state.current_qps = next;
                    info!(qps = next, "updated QPS target");
                }
                state.last_ramp = Instant::now();
            }
        }

        if state.current_qps == 0 {
            return;
        }

        // New second: reset the window.
        if now.duration_since(state.window_start) >= Duration::from_secs(1) {
            state.ops_in_window = 0;
            state.window_start = now;
        }

        // Quota for this window exhausted: sleep to the window boundary.
        if state.ops_in_window >= state.current_qps {
            let next_window = state.window_start + Duration::from_secs(1);
            let now = Instant::now();
            if next_window > now {
                std::thread::sleep(next_window - now);
            }
            state.ops_in_window = 0;
            state.window_start = Instant::now();
        }

        state.ops_in_window += 1;
    }
}

/// One ramp adjustment step: move `current` toward `end` and clamp there.
///
/// Once `current` has reached `end` the result stays pinned for the rest
/// of the run, whether ramping up or down.
fn next_qps(current: u32, start: u32, end: u32, mode: RampMode) -> u32 {
    match mode {
        RampMode::Linear { change } => {
            let rising = end > start;
            let moved = i64::from(current) + i64::from(change);
            let clamped = if rising {
                moved.min(i64::from(end))
            } else {
                moved.max(i64::from(end))
            };
            clamped.max(0) as u32
        }
        RampMode::Exponential { factor } => {
            let moved = (f64::from(current) * factor).round();
            let clamped = if end > start {
                moved.min(f64::from(end))
            } else {
                moved.max(f64::from(end))
            };
            clamped.max(0.0) as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn ramp_sequence(start: u32, end: u32, mode: RampMode, ticks: usize) -> Vec<u32> {
        let mut current = start;
        let mut seq = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            current = next_qps(current, start, end, mode);
            seq.push(current);
        }
        seq
    }

    #[test]
    fn test_linear_ramp_up_clamps_at_end() {
        let seq = ramp_sequence(10, 100, RampMode::Linear { change: 10 }, 12);
        assert_eq!(
            seq,
            vec![20, 30, 40, 50, 60, 70, 80, 90, 100, 100, 100, 100]
        );
        assert!(seq.iter().all(|&q| q <= 100));
    }

    #[test]
    fn test_linear_ramp_down_clamps_at_end() {
        let seq = ramp_sequence(100, 10, RampMode::Linear { change: -30 }, 5);
        assert_eq!(seq, vec![70, 40, 10, 10, 10]);
    }

    #[test]
    fn test_linear_overshoot_is_clamped() {
        // 10 -> 100 in steps of 40 would overshoot at the third step.
        let seq = ramp_sequence(10, 100, RampMode::Linear { change: 40 }, 4);
        assert_eq!(seq, vec![50, 90, 100, 100]);
    }

    #[test]
    fn test_exponential_ramp_up_clamps_at_end() {
        let seq = ramp_sequence(10, 100, RampMode::Exponential { factor: 2.0 }, 6);
        assert_eq!(seq, vec![20, 40, 80, 100, 100, 100]);
    }

    #[test]
    fn test_exponential_ramp_down_clamps_at_end() {
        let seq = ramp_sequence(100, 10, RampMode::Exponential { factor: 0.5 }, 5);
        assert_eq!(seq, vec![50, 25, 13, 10, 10]);
    }

    #[test]
    fn test_unconstrained_never_blocks() {
        let limiter = RateLimiter::new(RateLimit::Unconstrained);
        let start = Instant::now();
        for _ in 0..10_000 {
            limiter.throttle();
        }
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(limiter.current_qps(), 0);
    }

    #[test]
    fn test_static_limit_spans_windows() {
        // 120 admissions at 50 QPS need at least two full windows.
        let limiter = RateLimiter::new(RateLimit::Static { qps: 50 });
        let start = Instant::now();
        for _ in 0..120 {
            limiter.throttle();
        }
        // Two sleeps to successive window boundaries; allow scheduling slack.
        assert!(start.elapsed() >= Duration::from_millis(1900));
        assert_eq!(limiter.current_qps(), 50);
    }

    #[test]
    fn test_static_limit_caps_admissions_per_window() {
        use std::sync::atomic::{AtomicU32, Ordering};

        const QPS: u32 = 50;
        let limiter = RateLimiter::new(RateLimit::Static { qps: QPS });
        let start = Instant::now();
        let first_window = AtomicU32::new(0);

        // Four threads race through two windows' worth of admissions.
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..QPS / 2 {
                        limiter.throttle();
                        if start.elapsed() < Duration::from_millis(950) {
                            first_window.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        let admitted = first_window.load(Ordering::Relaxed);
        // One window's quota, plus slack for an admission that lands right
        // on the measurement edge.
        assert!(admitted <= QPS + 2, "admitted {admitted} in the first window");
        // The first window's quota is available immediately; requiring half
        // of it keeps the check meaningful without being scheduling-exact.
        assert!(admitted >= QPS / 2, "admitted only {admitted} in the first window");
    }

    #[test]
    fn test_ramp_limiter_starts_at_start_qps() {
        let limiter = RateLimiter::new(RateLimit::Ramp {
            start: 10,
            end: 100,
            interval: Duration::from_secs(60),
            mode: RampMode::Linear { change: 10 },
        });
        assert_eq!(limiter.current_qps(), 10);
    }
}
