//! Logging helper for fallible startup steps.

use std::fmt::Display;
use std::panic::Location;

/// Log an `Err` where it happens and keep propagating it.
///
/// Used by the binary so that `?` on bind/serve/config failures still leaves
/// a structured log line pointing at the call site.
pub trait ResultExt<T, E> {
    fn log(self, context: &str) -> Result<T, E>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log(self, context: &str) -> Result<T, E> {
        if let Err(ref e) = self {
            let location = Location::caller();
            tracing::error!(
                target: "vision_server",
                error = %e,
                location = %location,
                "{}",
                context
            );
        }
        self
    }
}
