//! Asset and sub-system identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies an asset or one of its sub-systems (a specific weapon or
/// sensor). `id` names the platform; `sub_id` names the component, with 0
/// meaning "the platform itself".
///
/// Equality compares both parts. Chain-of-command walks and assignment
/// bookkeeping frequently care only about the platform; use [`Id::same_unit`]
/// for those comparisons.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Id {
    pub id: u32,
    pub sub_id: u32,
}

impl Id {
    /// The invalid/unset identifier.
    pub const NONE: Id = Id { id: 0, sub_id: 0 };

    pub fn new(id: u32, sub_id: u32) -> Self {
        Self { id, sub_id }
    }

    /// A platform-level id with no sub-system part.
    pub fn unit(id: u32) -> Self {
        Self { id, sub_id: 0 }
    }

    /// An id of 0 is never assigned to a real asset or track.
    pub fn is_valid(&self) -> bool {
        self.id != 0
    }

    /// This id with the sub-system part stripped.
    pub fn unit_part(&self) -> Id {
        Id::unit(self.id)
    }

    /// True when both ids name the same platform, ignoring sub-systems.
    pub fn same_unit(&self, other: &Id) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.sub_id)
    }
}
