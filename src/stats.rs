use std::time::Duration;

/// Running round trip time figures over successful replies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RttStats {
    count: u32,
    min: Duration,
    max: Duration,
    total: Duration,
}

impl RttStats {
    pub fn record(&mut self, rtt: Duration) {
        if self.count == 0 {
            self.min = rtt;
            self.max = rtt;
        } else {
            self.min = self.min.min(rtt);
            self.max = self.max.max(rtt);
        }
        self.total += rtt;
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Sum of all recorded round trips, zero when nothing was recorded.
    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn min(&self) -> Option<Duration> {
        self.recorded(self.min)
    }

    pub fn max(&self) -> Option<Duration> {
        self.recorded(self.max)
    }

    pub fn avg(&self) -> Option<Duration> {
        self.recorded(self.total).map(|total| total / self.count)
    }

    fn recorded(&self, value: Duration) -> Option<Duration> {
        if self.count == 0 {
            None
        } else {
            Some(value)
        }
    }
}

/// Why the probing loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Every attempt up to the cap was resolved with an echo reply.
    Completed,
    TimedOut,
    /// Our own request came back unprocessed.
    NotProcessed,
    IcmpError,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub transmitted: u32,
    pub rtt: RttStats,
    pub stop: StopReason,
}

impl Summary {
    pub fn received(&self) -> u32 {
        self.rtt.count()
    }

    pub fn lost(&self) -> u32 {
        self.transmitted - self.received()
    }
}

/// Milliseconds with sub-millisecond precision, the unit every report uses.
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use more_asserts::{assert_ge, assert_le};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn empty_stats_report_nothing() {
        let stats = RttStats::default();
        assert_eq!(0, stats.count());
        assert_eq!(Duration::from_secs(0), stats.total());
        assert!(stats.min().is_none());
        assert!(stats.avg().is_none());
        assert!(stats.max().is_none());
    }

    #[test]
    fn five_replies() {
        let mut stats = RttStats::default();
        for rtt in [10, 20, 30, 15, 25].iter() {
            stats.record(ms(*rtt));
        }
        assert_eq!(5, stats.count());
        assert_eq!(Some(ms(10)), stats.min());
        assert_eq!(Some(ms(30)), stats.max());
        assert_eq!(Some(ms(20)), stats.avg());
        assert_eq!(ms(100), stats.total());
    }

    #[test]
    fn single_reply_is_min_avg_and_max() {
        let mut stats = RttStats::default();
        stats.record(Duration::from_micros(1234));
        assert_eq!(stats.min(), stats.max());
        assert_eq!(stats.min(), stats.avg());
    }

    #[test]
    fn avg_lies_between_min_and_max() {
        let mut stats = RttStats::default();
        for us in [900u64, 1_700, 350, 12_000].iter() {
            stats.record(Duration::from_micros(*us));
        }
        let avg = stats.avg().unwrap();
        assert_le!(stats.min().unwrap(), avg);
        assert_ge!(stats.max().unwrap(), avg);
    }

    #[test]
    fn summary_loss() {
        let mut rtt = RttStats::default();
        rtt.record(ms(3));
        rtt.record(ms(4));
        let summary = Summary {
            transmitted: 3,
            rtt,
            stop: StopReason::TimedOut,
        };
        assert_eq!(2, summary.received());
        assert_eq!(1, summary.lost());
    }

    #[test]
    fn millis_keep_fraction() {
        assert!((as_millis_f64(Duration::from_micros(1500)) - 1.5).abs() < 1e-9);
    }
}
