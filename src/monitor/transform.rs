//! Output transform algebra
//!
//! A transform is one of eight rotation/mirror combinations. The canonical
//! index is 0-3 for the plain rotations and 4-7 for their mirrored
//! counterparts, so mirroring is an index shift by 4 modulo 8.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// A transform label outside the eight recognized values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized transform: {0}")]
pub struct InvalidTransform(pub String);

/// Rotation and mirror state of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Transform {
    Normal = 0,
    Rotate90 = 1,
    Rotate180 = 2,
    Rotate270 = 3,
    Flipped = 4,
    Flipped90 = 5,
    Flipped180 = 6,
    Flipped270 = 7,
}

/// All transforms in canonical index order.
pub const ALL_TRANSFORMS: [Transform; 8] = [
    Transform::Normal,
    Transform::Rotate90,
    Transform::Rotate180,
    Transform::Rotate270,
    Transform::Flipped,
    Transform::Flipped90,
    Transform::Flipped180,
    Transform::Flipped270,
];

impl Transform {
    /// Canonical index, 0-7.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        ALL_TRANSFORMS.get(index as usize).copied()
    }

    /// Index of the rotation row shown to the user, 0-3, independent of
    /// mirror state.
    pub fn ui_index(self) -> usize {
        (self.index() % 4) as usize
    }

    /// Transform for a rotation choice 0-3 combined with a mirror state.
    pub fn from_ui_index(index: usize, mirrored: bool) -> Option<Self> {
        if index >= 4 {
            return None;
        }
        let offset = if mirrored { 4 } else { 0 };
        Self::from_index(index as u8 + offset)
    }

    /// The same rotation with the mirror state toggled.
    pub fn toggle_mirror(self) -> Self {
        Self::from_index((self.index() + 4) % 8).expect("index stays in 0..8")
    }

    pub fn is_mirrored(self) -> bool {
        self.index() >= 4
    }

    /// True for the 90 and 270 degree rotations, mirrored or not. These
    /// swap an output's width and height.
    pub fn is_rotated(self) -> bool {
        matches!(
            self,
            Transform::Rotate90
                | Transform::Rotate270
                | Transform::Flipped90
                | Transform::Flipped270
        )
    }

    pub fn is_upside_down(self) -> bool {
        matches!(self, Transform::Rotate180 | Transform::Flipped180)
    }

    /// Visual rotation angle in degrees. Mirrored rotations count in the
    /// opposite angular direction: a mirrored image rotated clockwise on
    /// the display appears counter-clockwise once the horizontal flip is
    /// already applied to the cached content.
    pub fn angle(self) -> i32 {
        match self {
            Transform::Normal => 0,
            Transform::Rotate90 => 90,
            Transform::Rotate180 => 180,
            Transform::Rotate270 => 270,
            Transform::Flipped => 0,
            Transform::Flipped90 => -90,
            Transform::Flipped180 => 180,
            Transform::Flipped270 => -270,
        }
    }

    /// The wire label used by the compositor tooling.
    pub fn label(self) -> &'static str {
        match self {
            Transform::Normal => "normal",
            Transform::Rotate90 => "90",
            Transform::Rotate180 => "180",
            Transform::Rotate270 => "270",
            Transform::Flipped => "flipped",
            Transform::Flipped90 => "flipped-90",
            Transform::Flipped180 => "flipped-180",
            Transform::Flipped270 => "flipped-270",
        }
    }
}

/// Incremental rotation to apply to cached visual content when the
/// transform changes from `prev` to `curr`. Applied as a delta so repeated
/// transform edits compose; a mirror-only toggle yields zero.
pub fn rotation_delta(prev: Transform, curr: Transform) -> i32 {
    curr.angle() - prev.angle()
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Transform {
    type Err = InvalidTransform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_TRANSFORMS
            .iter()
            .copied()
            .find(|t| t.label() == s)
            .ok_or_else(|| InvalidTransform(s.to_string()))
    }
}

impl Serialize for Transform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
