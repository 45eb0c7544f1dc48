//! UUID generation.

use uuid::Uuid;

/// Generates a new UUID v4.
///
/// Item and client ids are minted from this.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}
