use std::time::Duration;

pub(super) const EVENT_DRAIN_WAIT: Duration = Duration::from_millis(1);
pub(super) const INPUT_POLL_WAIT: Duration = Duration::from_millis(50);
pub(super) const SHUTDOWN_GRACE_TIMEOUT: Duration = Duration::from_secs(3);
pub(super) const PAGE_SCROLL_LINES: usize = 10;

pub(super) const HEADER_HEIGHT: u16 = 3;
pub(super) const QUERY_HEIGHT: u16 = 3;
pub(super) const FOOTER_HEIGHT: u16 = 1;
