//! Identifier parsing shared by the HTTP layer and the repositories.
//!
//! Every identifier in the system is a UUID exchanged in its 36-character
//! hyphenated form. Create paths and lookup paths both go through
//! [`parse_id`] so they accept exactly the same inputs.

use uuid::Uuid;

/// Length of the hyphenated text form, e.g. `67e55044-10b1-426f-9247-bb680e5fe0c8`.
pub const ID_TEXT_LEN: usize = 36;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be a {len}-character identifier", len = ID_TEXT_LEN)]
    Malformed { field: &'static str },
}

/// Parse a hyphenated UUID, naming `field` in the error.
pub fn parse_id(field: &'static str, raw: &str) -> Result<Uuid, IdError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(IdError::Missing { field });
    }
    if raw.len() != ID_TEXT_LEN {
        return Err(IdError::Malformed { field });
    }
    Uuid::parse_str(raw).map_err(|_| IdError::Malformed { field })
}
