//! Error types for the Nova render pipeline.
//!
//! Every error in this crate is fatal for the operation that observed it:
//! there is no retry policy for GPU submissions, and masking a resource-state
//! bug would corrupt later frames. Callers decide whether a failed
//! registration or frame is survivable for the process.

use std::fmt;

/// Result type for render pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Render pipeline errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A scene snapshot is internally inconsistent (e.g., a model references
    /// a geometry or material id absent from the snapshot). Registration is
    /// aborted and no handle is returned.
    Configuration(String),

    /// The backend failed to create a GPU resource. Fatal for the
    /// registration call it occurred in; no partial viewport or scene state
    /// stays reachable.
    BackendAllocation(String),

    /// A caller passed a viewport, scene, or model identifier that is not
    /// present in the registry. Programmer error.
    InvalidHandle(String),

    /// An internal invariant was violated (cache index out of range, binding
    /// table mismatch). Indicates a bug in pass sequencing.
    StateAssumption(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Error::BackendAllocation(msg) => write!(f, "Backend allocation failed: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::StateAssumption(msg) => write!(f, "State assumption violated: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Construct an [`Error`] of the given variant, logging it at ERROR severity
/// with file:line information.
///
/// # Example
///
/// ```no_run
/// # use nova_render_pipeline::render_err;
/// let err = render_err!(InvalidHandle, "nova::HybridPipeline",
///     "viewport handle {:?} not registered", 42);
/// ```
#[macro_export]
macro_rules! render_err {
    ($variant:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::dispatch_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!(),
        );
        $crate::error::Error::$variant(message)
    }};
}

/// Log an error and early-return it from the enclosing function.
///
/// Shorthand for `return Err(render_err!(...))`.
#[macro_export]
macro_rules! render_bail {
    ($variant:ident, $source:expr, $($arg:tt)*) => {
        return Err($crate::render_err!($variant, $source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
