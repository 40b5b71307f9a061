//! Request correlation ids.

use uuid::Uuid;

/// A fresh UUID v4 used to correlate the log lines of one request.
///
/// ```
/// let id = spendwise::logging::generate_request_id();
/// assert_eq!(id.len(), 36);
/// ```
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
