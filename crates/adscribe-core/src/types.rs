//! Shared types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Items that live in an [`IndexedCollection`](crate::IndexedCollection).
///
/// The collection owns the index: it rewrites it after every structural
/// change so that it always equals the item's position.
pub trait Indexed {
    /// Stable identity of the item
    fn id(&self) -> Uuid;

    /// Overwrite the identity; only used to undo edits that changed it
    fn set_id(&mut self, id: Uuid);

    /// Current display index
    fn index(&self) -> usize;

    /// Overwrite the display index
    fn set_index(&mut self, index: usize);
}

/// Description kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionKind {
    /// Played over the video inside a space
    Regular,
    /// Pauses the video, zero duration in video time
    Extended,
}

impl std::fmt::Display for DescriptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptionKind::Regular => write!(f, "regular"),
            DescriptionKind::Extended => write!(f, "extended"),
        }
    }
}

/// An authored description interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    /// Stable identity
    pub id: Uuid,
    /// Start position in video time (milliseconds)
    pub start_ms: f64,
    /// End position in video time (milliseconds)
    pub end_ms: f64,
    /// Description text
    pub text: String,
    /// Extended descriptions are displayed apart from regular ones
    #[serde(default)]
    pub is_extended: bool,
    /// Display index
    #[serde(default)]
    pub index: usize,
    /// Recorded clip, relative to the project's descriptions folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<PathBuf>,
}

impl Description {
    /// Create a regular description covering `start_ms..end_ms`
    pub fn regular(start_ms: f64, end_ms: f64, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_ms,
            end_ms,
            text: text.into(),
            is_extended: false,
            index: 0,
            audio_file: None,
        }
    }

    /// Create an extended description anchored at `start_ms`
    pub fn extended(start_ms: f64, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_ms,
            end_ms: start_ms,
            text: text.into(),
            is_extended: true,
            index: 0,
            audio_file: None,
        }
    }

    /// Which derived view the description belongs to
    pub fn kind(&self) -> DescriptionKind {
        if self.is_extended {
            DescriptionKind::Extended
        } else {
            DescriptionKind::Regular
        }
    }

    /// Length in video time (milliseconds)
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }
}

impl Indexed for Description {
    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn index(&self) -> usize {
        self.index
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

/// A silence window where a description may be placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    /// Stable identity
    pub id: Uuid,
    /// Start position in video time (milliseconds)
    pub start_ms: f64,
    /// End position in video time (milliseconds)
    pub end_ms: f64,
    /// Display index
    #[serde(default)]
    pub index: usize,
    /// Free-form note
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl Space {
    /// Create a space covering `start_ms..end_ms`
    pub fn new(start_ms: f64, end_ms: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_ms,
            end_ms,
            index: 0,
            text: String::new(),
        }
    }

    /// Length in video time (milliseconds)
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }

    /// Whether two spaces share any time
    pub fn overlaps(&self, other: &Space) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }
}

impl Indexed for Space {
    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn index(&self) -> usize {
        self.index
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}
