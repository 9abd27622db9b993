use std::time::Duration;

/// Knobs of a probing run. `Default` gives five attempts, a five second wait
/// per reply and one second between attempts.
#[derive(Clone, Debug, PartialEq)]
pub struct PingConfig {
    /// Attempt cap.
    pub count: u32,
    /// How long to wait for each reply.
    pub timeout: Duration,
    /// Pause between attempts, skipped after the last one.
    pub interval: Duration,
    /// TTL for outgoing packets, system default when unset.
    pub ttl: Option<u32>,
}

impl Default for PingConfig {
    fn default() -> Self {
        PingConfig {
            count: 5,
            timeout: Duration::from_secs(5),
            interval: Duration::from_secs(1),
            ttl: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PingConfig::default();
        assert_eq!(5, config.count);
        assert_eq!(Duration::from_secs(5), config.timeout);
        assert_eq!(Duration::from_secs(1), config.interval);
        assert_eq!(None, config.ttl);
    }
}
