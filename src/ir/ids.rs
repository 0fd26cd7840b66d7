//! Newtype IDs for type-safe identification of dataset elements.
//!
//! Two ID spaces meet in this crate: the (possibly sparse) category ids used
//! by the external annotation store, and the dense zero-based labels the
//! detector trains against.

use serde::{Deserialize, Serialize};

/// Identifier of an image in the external annotation store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl ImageId {
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ImageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A category id as stored in the external (COCO) annotation store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CocoCategoryId(pub u64);

impl CocoCategoryId {
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for CocoCategoryId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A dense, zero-based class index in this crate's own label space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub usize);

impl Label {
    #[inline]
    pub fn new(label: usize) -> Self {
        Self(label)
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}
