use std::time::Duration;

/// Standard date format used throughout the codebase: "2025-01-15"
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Session timestamps are naive local datetimes: "2025-01-15T09:30:00"
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// First day covered by the "All" preset
pub(crate) const ALL_TIME_START: (i32, u32, u32) = (2020, 1, 1);

pub(crate) const SETTINGS_PREFIX: &str = "timeflow.settings.";
pub(crate) const LEGACY_SETTINGS_PREFIX: &str = "cfab.settings.";

pub(crate) const DEFAULT_REFRESH_THROTTLE: Duration = Duration::from_millis(250);
pub(crate) const DEFAULT_STATUS_POLL: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_SESSION_COUNT_POLL: Duration = Duration::from_secs(10);

/// A daemon heartbeat older than this is reported as not running
pub(crate) const DAEMON_HEARTBEAT_TIMEOUT_SECS: i64 = 30;

pub(crate) const DB_FILE_NAME: &str = "timeflow_dashboard.db";
pub(crate) const SETTINGS_FILE_NAME: &str = "settings.json";
pub(crate) const DAEMON_STATUS_FILE_NAME: &str = "daemon_status.json";
pub(crate) const IMPORT_DIR_NAME: &str = "import";

pub(crate) const ARCHIVE_VERSION: u32 = 1;
