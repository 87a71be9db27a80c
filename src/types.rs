use std::any::Any;
use std::sync::Arc;

/// Opaque value attached to a match: bound alternative values and
/// per-element sub-results reported by node patterns.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Capture group number. Group 0 is the whole match.
pub type GroupId = usize;

/// Half-open element span `[start, end)`.
pub type Span = (usize, usize);
