// crates/network/src/progress.rs
//! Transfer progress tracking

use std::time::{Duration, Instant};

/// Byte counters for one exchange, as last reported by the transport
#[derive(Debug, Clone, Default)]
pub struct TransferProgress {
    /// Bytes received so far; never decreases
    received: u64,
    /// Total bytes expected, once the transport knows the content length
    total: Option<u64>,
    /// Transfer speed in bytes per second
    bytes_per_second: f64,
    started: Option<Instant>,
}

impl TransferProgress {
    /// Creates an empty tracker with unknown total
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of the transfer, used for speed estimation
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Records a progress report.
    ///
    /// A smaller `received` than already seen is ignored; a `None` total
    /// keeps the last known total. Returns true if anything changed.
    pub fn record(&mut self, received: u64, total: Option<u64>) -> bool {
        let mut changed = false;

        if received > self.received {
            self.received = received;
            changed = true;
        } else if received < self.received {
            log::debug!(
                "Ignoring regressing progress report ({} < {})",
                received,
                self.received
            );
        }

        if total.is_some() && total != self.total {
            self.total = total;
            changed = true;
        }

        if let Some(started) = self.started {
            let elapsed = started.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                self.bytes_per_second = self.received as f64 / elapsed;
            }
        }

        changed
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn bytes_per_second(&self) -> f64 {
        self.bytes_per_second
    }

    /// Returns progress as a percentage (0-100)
    pub fn percentage(&self) -> Option<f64> {
        self.total.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.received as f64 / total as f64 * 100.0).min(100.0)
            }
        })
    }

    /// Estimated time remaining, once both total and speed are known
    pub fn estimated_remaining(&self) -> Option<Duration> {
        let total = self.total?;
        if self.bytes_per_second <= 0.0 {
            return None;
        }
        let remaining = total.saturating_sub(self.received) as f64;
        Some(Duration::from_secs_f64(remaining / self.bytes_per_second))
    }

    /// Returns true once the known total has been received
    pub fn is_complete(&self) -> bool {
        match self.total {
            Some(total) => self.received >= total,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_new() {
        let progress = TransferProgress::new();
        assert_eq!(progress.received(), 0);
        assert_eq!(progress.total(), None);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_progress_record() {
        let mut progress = TransferProgress::new();
        assert!(progress.record(250, Some(1000)));
        assert_eq!(progress.received(), 250);
        assert_eq!(progress.percentage(), Some(25.0));
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut progress = TransferProgress::new();
        progress.record(500, Some(1000));
        assert!(!progress.record(100, Some(1000)));
        assert_eq!(progress.received(), 500);
    }

    #[test]
    fn test_total_keeps_last_known() {
        let mut progress = TransferProgress::new();
        progress.record(10, Some(1000));
        progress.record(20, None);
        assert_eq!(progress.total(), Some(1000));
    }

    #[test]
    fn test_progress_complete() {
        let mut progress = TransferProgress::new();
        progress.record(999, Some(1000));
        assert!(!progress.is_complete());
        progress.record(1000, Some(1000));
        assert!(progress.is_complete());
    }

    #[test]
    fn test_progress_unknown_size() {
        let mut progress = TransferProgress::new();
        progress.record(4096, None);
        assert_eq!(progress.percentage(), None);
        assert_eq!(progress.estimated_remaining(), None);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_progress_zero_total() {
        let mut progress = TransferProgress::new();
        progress.record(0, Some(0));
        assert_eq!(progress.percentage(), Some(100.0));
    }

    #[test]
    fn test_speed_calculation() {
        let mut progress = TransferProgress::new();
        progress.start();
        std::thread::sleep(Duration::from_millis(10));
        progress.record(1000, Some(2000));

        assert!(progress.bytes_per_second() > 0.0);
        assert!(progress.estimated_remaining().is_some());
    }
}
