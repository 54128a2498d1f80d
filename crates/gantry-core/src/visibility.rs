//! Project visibility levels.

use serde::{Deserialize, Serialize};

/// How widely a project is visible. The numeric levels match the wire
/// encoding used by the persistence layer (0/10/20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Internal,
    Public,
}

impl Visibility {
    /// Numeric level as stored by the persistence layer.
    pub fn level(&self) -> u8 {
        match self {
            Visibility::Private => 0,
            Visibility::Internal => 10,
            Visibility::Public => 20,
        }
    }

    /// Decode a stored numeric level. Unknown levels are rejected.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Visibility::Private),
            10 => Some(Visibility::Internal),
            20 => Some(Visibility::Public),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip() {
        for vis in [Visibility::Private, Visibility::Internal, Visibility::Public] {
            assert_eq!(Visibility::from_level(vis.level()), Some(vis));
        }
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert_eq!(Visibility::from_level(5), None);
    }

    #[test]
    fn test_ordering_matches_openness() {
        assert!(Visibility::Private < Visibility::Internal);
        assert!(Visibility::Internal < Visibility::Public);
    }
}
