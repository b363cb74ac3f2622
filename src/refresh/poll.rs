use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::backend::DaemonStatus;
use crate::error::BackendError;

/// Fixed-period schedule. The first check is due immediately.
#[derive(Debug)]
pub(crate) struct IntervalPoller {
    period: Duration,
    next_due: Option<Instant>,
    cancelled: bool,
}

impl IntervalPoller {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
            cancelled: false,
        }
    }

    pub(crate) fn due(&mut self, now: Instant) -> bool {
        if self.cancelled {
            return false;
        }
        match self.next_due {
            Some(at) if now < at => false,
            _ => {
                self.next_due = Some(now + self.period);
                true
            }
        }
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        if self.cancelled { None } else { self.next_due }
    }

    pub(crate) fn cancel(&mut self) {
        self.cancelled = true;
        self.next_due = None;
    }
}

/// Last known daemon status; a failed poll keeps the previous value.
#[derive(Debug, Default)]
pub(crate) struct DaemonMonitor {
    last: Option<DaemonStatus>,
    consecutive_failures: u32,
}

impl DaemonMonitor {
    pub(crate) fn status(&self) -> Option<&DaemonStatus> {
        self.last.as_ref()
    }

    pub(crate) fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns true when the status differs from the last known one.
    pub(crate) fn record(&mut self, result: Result<DaemonStatus, BackendError>) -> bool {
        match result {
            Ok(status) => {
                self.consecutive_failures = 0;
                if self.last.as_ref() == Some(&status) {
                    return false;
                }
                debug!(
                    event = "dashboard.daemon.status_changed",
                    running = status.running,
                    unassigned_sessions = status.unassigned_sessions,
                );
                self.last = Some(status);
                true
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    event = "dashboard.daemon.status_failed",
                    error = %e,
                    failures = self.consecutive_failures,
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(running: bool, unassigned: u64) -> DaemonStatus {
        DaemonStatus {
            running,
            unassigned_sessions: unassigned,
            ..DaemonStatus::default()
        }
    }

    #[test]
    fn poller_fires_once_per_period() {
        let t0 = Instant::now();
        let mut poller = IntervalPoller::new(Duration::from_secs(5));
        assert!(poller.due(t0));
        assert!(!poller.due(t0 + Duration::from_secs(1)));
        assert!(!poller.due(t0 + Duration::from_millis(4_999)));
        assert!(poller.due(t0 + Duration::from_secs(5)));
        assert_eq!(poller.next_deadline(), Some(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn cancelled_poller_never_fires() {
        let t0 = Instant::now();
        let mut poller = IntervalPoller::new(Duration::from_secs(5));
        poller.cancel();
        assert!(!poller.due(t0));
        assert_eq!(poller.next_deadline(), None);
    }

    #[test]
    fn monitor_reports_changes_only() {
        let mut monitor = DaemonMonitor::default();
        assert!(monitor.record(Ok(status(true, 3))));
        assert!(!monitor.record(Ok(status(true, 3))));
        assert!(monitor.record(Ok(status(true, 4))));
    }

    #[test]
    fn monitor_keeps_stale_status_on_failure() {
        let mut monitor = DaemonMonitor::default();
        monitor.record(Ok(status(true, 1)));
        let changed = monitor.record(Err(BackendError::Unsupported {
            operation: "daemon_status",
        }));
        assert!(!changed);
        assert_eq!(monitor.status(), Some(&status(true, 1)));
        assert_eq!(monitor.consecutive_failures(), 1);

        monitor.record(Ok(status(true, 1)));
        assert_eq!(monitor.consecutive_failures(), 0);
    }
}
