//! Statistics snapshot for [`ActivationCache`](crate::cache::ActivationCache).

/// Point-in-time view of a cache's counters, captured under one lock
/// acquisition by [`stats`](crate::cache::ActivationCache::stats).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CacheStatsSnapshot {
    pub request_count: u64,
    pub activation_count: u64,
    pub stale_timeout_count: u64,
    pub distinct_request_count: usize,

    // gauges captured at snapshot time
    pub len: usize,
    pub capacity: usize,

    pub hit_rate: f64,
    pub stale_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_zeroed() {
        let snapshot = CacheStatsSnapshot::default();
        assert_eq!(snapshot.request_count, 0);
        assert_eq!(snapshot.len, 0);
        assert_eq!(snapshot.hit_rate, 0.0);
    }
}
