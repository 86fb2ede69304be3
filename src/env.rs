use std::ffi::OsStr;

use tracing_subscriber::EnvFilter;

/// Filter directives for internal logging, e.g. `E20_LOG=debug`.
pub const LOG_VAR: &str = "E20_LOG";
/// Set to `1` to behave as if `--minimal` was passed.
pub const MINIMAL_VAR: &str = "E20_MINIMAL";

/// Install the stderr log subscriber. Later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

pub fn is_minimal_forced() -> bool {
    var_is(MINIMAL_VAR, "1")
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
