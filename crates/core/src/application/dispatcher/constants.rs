// Dispatch constants (no magic values)

/// Default concurrency bound when neither flag nor config sets one
pub const DEFAULT_NUM_PROC: usize = 16;

/// Default probe command; the node address is appended
pub const DEFAULT_PING_CMD: &str = "ping -q -c 1 -t 1";

/// `sleep_time` value meaning "run one job at a time"
pub const SERIALIZED_SLEEP_TIME: i64 = -1;
