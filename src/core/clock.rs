use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hands out investment ids derived from the creation time in milliseconds.
/// Two calls in the same millisecond still get distinct, increasing ids.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an id that is at least `now` in milliseconds, greater than
    /// any id returned before and greater than `floor` when given.
    pub fn next(&self, now: DateTime<Utc>, floor: Option<i64>) -> i64 {
        let candidate = now.timestamp_millis().max(floor.map_or(i64::MIN, |f| f + 1));
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let next = candidate.max(current + 1);
            match self
                .last
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Clock;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::Mutex;

    /// A clock that only moves when told to.
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ids_increase_within_same_millisecond() {
        let ids = IdGenerator::new();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let first = ids.next(now, None);
        let second = ids.next(now, None);
        let third = ids.next(now, None);

        assert_eq!(first, now.timestamp_millis());
        assert_eq!(second, first + 1);
        assert_eq!(third, first + 2);
    }

    #[test]
    fn test_ids_respect_floor() {
        let ids = IdGenerator::new();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let floor = now.timestamp_millis() + 5_000;

        assert_eq!(ids.next(now, Some(floor)), floor + 1);
    }

    #[test]
    fn test_ids_never_go_backwards_with_clock() {
        let ids = IdGenerator::new();
        let later = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let first = ids.next(later, None);
        assert!(ids.next(earlier, None) > first);
    }
}
