/// How far ahead each resource's calendar is fetched
pub const DEFAULT_WINDOW_MONTHS: u32 = 2;

pub const DEFAULT_POLL_INTERVAL: &str = "5s";

pub const DEFAULT_PROVIDER: &str = "file";

pub const PROVIDER_TIMEOUT_SECS: u64 = 30;
