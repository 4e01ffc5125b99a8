//! # Entity Ids
//!
//! Ids embed a monotonically-increasing time component plus a random
//! suffix, so concurrent writers on any number of devices can mint ids
//! without coordination and prefix scans stay roughly time-ordered.
//!
//! Format: `ttttttttt-rrrrrrrr` where `t` is the creation time in
//! milliseconds encoded as fixed-width base36 and `r` is the first 8 hex
//! digits of a UUID v4.

use chrono::Utc;
use uuid::Uuid;

/// Width of the base36 time prefix. Nine base36 digits cover timestamps
/// until roughly the year 5000, keeping the prefix lexicographically
/// ordered.
const TIME_WIDTH: usize = 9;

/// Generates a new entity id.
///
/// ## Example
/// ```rust
/// let id = atlas_core::ids::generate_id();
/// assert_eq!(id.len(), 18);
/// assert_eq!(id.as_bytes()[9], b'-');
/// ```
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", encode_base36(millis), &suffix[..8])
}

/// Encodes a non-negative millisecond timestamp as fixed-width base36.
fn encode_base36(mut value: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut buf = [b'0'; TIME_WIDTH];
    let mut pos = TIME_WIDTH;
    while value > 0 && pos > 0 {
        pos -= 1;
        buf[pos] = DIGITS[(value % 36) as usize];
        value /= 36;
    }

    String::from_utf8_lossy(&buf).into_owned()
}
