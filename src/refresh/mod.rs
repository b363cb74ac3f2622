//! Change propagation: the throttled refresh counter and the polling schedules feeding it

mod bus;
mod poll;

pub(crate) use bus::ThrottledRefreshBus;
pub(crate) use poll::{DaemonMonitor, IntervalPoller};
