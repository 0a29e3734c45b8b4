/// Maximum number of lanes a technician row grows to on the timeline
pub const DEFAULT_LANE_CAP: usize = 6;

/// Visible timeline window, in local hours
pub const DEFAULT_WINDOW_START_HOUR: u32 = 7;
pub const DEFAULT_WINDOW_END_HOUR: u32 = 21;

/// Delay between the last date change and the refetch in `watch`
pub const DEFAULT_DEBOUNCE: &str = "300ms";

/// Per-request timeout for a single record type
pub const DEFAULT_REQUEST_TIMEOUT: &str = "15s";

/// Used when a record carries a start but no end
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

pub const DEFAULT_TIMEZONE: &str = "Europe/Athens";

/// Page size for EspoCRM list requests
pub const DEFAULT_MAX_SIZE: usize = 200;

/// Days fetched concurrently by range views
pub const RANGE_FETCH_CONCURRENCY: usize = 4;

pub const UNASSIGNED_TECHNICIAN: &str = "Unassigned";
