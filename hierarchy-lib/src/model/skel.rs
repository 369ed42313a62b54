//! Skeleton type (Node/Leaf)

use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::DropError;

/// The two kinds of entries a hierarchy module stores.
///
/// Nodes may own children and can be expanded; leaves never own children.
/// The backend addresses them as separate skeleton types (`list/node`,
/// `list/leaf`, `skelType=node`, ...).
///
/// # Examples
///
/// ```
/// use hierarchy_lib::model::SkelType;
///
/// assert_eq!(SkelType::Node.as_str(), "node");
/// assert!(SkelType::Node.behavior().can_expand);
/// assert!(!SkelType::Leaf.behavior().can_expand);
/// assert_eq!("leaf".parse::<SkelType>().unwrap(), SkelType::Leaf);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkelType {
    /// An entry that may have children.
    Node,
    /// An entry that never has children.
    Leaf,
}

/// Per-kind presentation and interaction behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkelBehavior {
    /// Icon identifier for the renderer.
    pub icon: &'static str,
    /// Whether the entry shows an expand toggle.
    pub can_expand: bool,
}

const NODE_BEHAVIOR: SkelBehavior = SkelBehavior {
    icon: "icons-folder",
    can_expand: true,
};

const LEAF_BEHAVIOR: SkelBehavior = SkelBehavior {
    icon: "icons-file",
    can_expand: false,
};

impl SkelType {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Leaf => "leaf",
        }
    }

    /// Returns the behaviour table entry for this kind.
    pub fn behavior(&self) -> &'static SkelBehavior {
        match self {
            Self::Node => &NODE_BEHAVIOR,
            Self::Leaf => &LEAF_BEHAVIOR,
        }
    }
}

impl FromStr for SkelType {
    type Err = DropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Self::Node),
            "leaf" => Ok(Self::Leaf),
            other => Err(DropError::UnknownKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for SkelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
