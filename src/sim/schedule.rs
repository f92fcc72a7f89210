use std::time::{Duration, Instant};

pub const MIN_INTERVAL: Duration = Duration::from_millis(10);
pub const MAX_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// When the next step is due.
///
/// The clock is passed in rather than read, so the owner decides what "now"
/// is. A deadline only exists while running; stopping drops it, so nothing
/// scheduled before a stop can fire after it.
#[derive(Debug, Clone)]
pub struct Schedule {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Schedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: clamp_interval(interval),
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// starts running, first step one interval from `now`.
    /// Returns false (and changes nothing) if already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_running() {
            return false;
        }
        self.deadline = Some(now + self.interval);
        true
    }

    /// returns whether it was running.
    pub fn stop(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// takes effect immediately: a running schedule is re-armed one new
    /// interval from `now`, replacing the old deadline.
    pub fn set_interval(&mut self, now: Instant, interval: Duration) {
        self.interval = clamp_interval(interval);
        if self.is_running() {
            self.deadline = Some(now + self.interval);
        }
    }

    /// true if a step is due at `now`. Fires at most once per call and
    /// re-arms from `now`, so a late poll never causes a burst of steps.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

pub fn clamp_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn stopped_never_fires() {
        let mut schedule = Schedule::new(50 * MS);
        let now = Instant::now();
        assert!(!schedule.poll(now + 10_000 * MS));
    }

    #[test]
    fn first_step_waits_a_full_interval() {
        let mut schedule = Schedule::new(50 * MS);
        let t0 = Instant::now();
        assert!(schedule.start(t0));
        assert!(!schedule.poll(t0));
        assert!(!schedule.poll(t0 + 49 * MS));
        assert!(schedule.poll(t0 + 50 * MS));
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let mut schedule = Schedule::new(50 * MS);
        let t0 = Instant::now();
        schedule.start(t0);
        assert!(!schedule.start(t0 + 40 * MS));
        assert_eq!(schedule.deadline(), Some(t0 + 50 * MS));
    }

    #[test]
    fn restart_after_stop_drops_the_old_deadline() {
        let mut schedule = Schedule::new(50 * MS);
        let t0 = Instant::now();
        schedule.start(t0);
        assert!(schedule.stop());
        assert!(!schedule.poll(t0 + 50 * MS));

        let t1 = t0 + 45 * MS;
        schedule.start(t1);
        // the deadline of the previous run has passed, but must not fire
        assert!(!schedule.poll(t0 + 50 * MS));
        assert!(!schedule.poll(t1 + 49 * MS));
        assert!(schedule.poll(t1 + 50 * MS));
    }

    #[test]
    fn set_interval_while_running_reschedules_once() {
        let mut schedule = Schedule::new(100 * MS);
        let t0 = Instant::now();
        schedule.start(t0);

        let t1 = t0 + 80 * MS;
        schedule.set_interval(t1, 30 * MS);
        assert_eq!(schedule.deadline(), Some(t1 + 30 * MS));
        // the old deadline is gone
        assert!(!schedule.poll(t0 + 100 * MS - MS));
        assert!(schedule.poll(t1 + 30 * MS));
        assert!(!schedule.poll(t1 + 30 * MS));
        assert!(schedule.poll(t1 + 60 * MS));
    }

    #[test]
    fn set_interval_while_stopped_is_kept_for_next_start() {
        let mut schedule = Schedule::new(100 * MS);
        let t0 = Instant::now();
        schedule.set_interval(t0, 20 * MS);
        assert!(!schedule.is_running());
        schedule.start(t0);
        assert_eq!(schedule.deadline(), Some(t0 + 20 * MS));
    }

    #[test]
    fn late_poll_fires_once() {
        let mut schedule = Schedule::new(10 * MS);
        let t0 = Instant::now();
        schedule.start(t0);
        let late = t0 + 1000 * MS;
        assert!(schedule.poll(late));
        assert!(!schedule.poll(late));
        assert_eq!(schedule.deadline(), Some(late + 10 * MS));
    }

    #[test]
    fn intervals_are_clamped() {
        assert_eq!(Schedule::new(Duration::ZERO).interval(), MIN_INTERVAL);
        assert_eq!(Schedule::new(60_000 * MS).interval(), MAX_INTERVAL);
    }
}
