use std::sync::atomic::{AtomicU64, Ordering};

/// 转发统计计数器
#[derive(Debug, Default)]
pub struct ForwarderStats {
    published: AtomicU64,
    bytes_published: AtomicU64,
    render_failures: AtomicU64,
    dispatch_failures: AtomicU64,
    dropped_inactive: AtomicU64,
}

/// 统计快照
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub published: u64,
    pub bytes_published: u64,
    pub render_failures: u64,
    pub dispatch_failures: u64,
    pub dropped_inactive: u64,
}

impl StatsSnapshot {
    /// 所有被丢弃的事件数
    pub fn dropped(&self) -> u64 {
        self.render_failures + self.dispatch_failures + self.dropped_inactive
    }
}

impl ForwarderStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self, bytes: usize) {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.bytes_published.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_render_failure(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inactive(&self) {
        self.dropped_inactive.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            dropped_inactive: self.dropped_inactive.load(Ordering::Relaxed),
        }
    }
}
