//! Volume content strategies.

use serde::{Deserialize, Serialize};
use stowage_common::VolumeHandle;

/// How a new volume's initial content is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Strategy {
    /// The volume starts with no content.
    Empty,
    /// The volume is a copy-on-write clone of a live parent volume.
    Cow {
        /// Handle of the live volume to clone from.
        parent: VolumeHandle,
    },
}

impl Strategy {
    /// The parent handle, when this is a copy-on-write strategy.
    #[must_use]
    pub fn parent(&self) -> Option<&VolumeHandle> {
        match self {
            Self::Empty => None,
            Self::Cow { parent } => Some(parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_of_cow_strategy() {
        let h = VolumeHandle::new("base").unwrap();
        let strategy = Strategy::Cow { parent: h.clone() };
        assert_eq!(strategy.parent(), Some(&h));
        assert_eq!(Strategy::Empty.parent(), None);
    }

    #[test]
    fn strategy_round_trips_as_json() {
        let h = VolumeHandle::new("base").unwrap();
        let json = serde_json::to_string(&Strategy::Cow { parent: h }).unwrap();
        assert!(json.contains("\"type\":\"cow\""));

        let back: Strategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back.parent().unwrap().as_str(), "base");
    }
}
