//! Classification hierarchies and their typed levels.
//!
//! A [`Hierarchy`] owns an ordered list of [`Level`]s. Each level restricts
//! which node types may be assigned to it through its allowed-type set. Levels
//! are fetched from an external provider and only read here.
//!
//! An empty allowed-type set has two readings depending on the question asked:
//!
//! - [`Level::accepts`]: an empty set accepts *any* type, so an assignment to
//!   an unrestricted level always passes the type check.
//! - [`Level::offers_types`]: an empty set offers *no* type to create, so a
//!   "add child" affordance pointing at that level is not offered.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// A named classification scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    id: Id,
    name: String,
}

impl Hierarchy {
    pub fn new(id: impl Into<Id>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One level of a hierarchy.
///
/// Deserializes from the provider shape
/// `{"id": .., "levelNumber": .., "label": .., "allowedTypes": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    id: Id,
    level_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default)]
    allowed_types: BTreeSet<String>,
}

impl Level {
    /// Create a level with no type restriction.
    pub fn new(id: impl Into<Id>, level_number: u32) -> Self {
        Self {
            id: id.into(),
            level_number,
            label: None,
            allowed_types: BTreeSet::new(),
        }
    }

    /// Set the display label (builder style).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the allowed types (builder style).
    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// 1-based position of this level within its hierarchy.
    pub fn level_number(&self) -> u32 {
        self.level_number
    }

    /// Display label, falling back to the level number.
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("Level {}", self.level_number))
    }

    pub fn allowed_types(&self) -> &BTreeSet<String> {
        &self.allowed_types
    }

    /// Whether a node of `node_type` may be assigned to this level.
    ///
    /// An empty allowed-type set accepts any type.
    pub fn accepts(&self, node_type: &str) -> bool {
        self.allowed_types.is_empty() || self.allowed_types.contains(node_type)
    }

    /// Whether this level names at least one type a new node could be created with.
    pub fn offers_types(&self) -> bool {
        !self.allowed_types.is_empty()
    }
}

/// Errors raised while building a [`Levels`] list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelsError {
    #[error("level numbers start at 1, level `{0}` has 0")]
    ZeroLevelNumber(Id),

    #[error("level number {number} is used by both `{first}` and `{second}`")]
    DuplicateLevelNumber { number: u32, first: Id, second: Id },

    #[error("level id `{0}` appears more than once")]
    DuplicateLevelId(Id),
}

/// The ordered levels of one hierarchy.
///
/// Levels are kept sorted by level number; numbers are unique and start at 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels {
    levels: Vec<Level>,
}

impl Levels {
    /// Build a level list, sorting by level number.
    ///
    /// # Errors
    ///
    /// Returns [`LevelsError`] if a level number is 0, or a level number or
    /// id appears twice.
    pub fn new(mut levels: Vec<Level>) -> Result<Self, LevelsError> {
        levels.sort_by_key(Level::level_number);
        let mut seen = HashSet::with_capacity(levels.len());
        for level in &levels {
            if level.level_number == 0 {
                return Err(LevelsError::ZeroLevelNumber(level.id));
            }
            if !seen.insert(level.id) {
                return Err(LevelsError::DuplicateLevelId(level.id));
            }
        }
        for pair in levels.windows(2) {
            if pair[0].level_number == pair[1].level_number {
                return Err(LevelsError::DuplicateLevelNumber {
                    number: pair[0].level_number,
                    first: pair[0].id,
                    second: pair[1].id,
                });
            }
        }
        Ok(Self { levels })
    }

    /// The empty level list, used while a fetch is pending.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    pub fn by_id(&self, id: Id) -> Option<&Level> {
        self.levels.iter().find(|level| level.id == id)
    }

    pub fn by_number(&self, level_number: u32) -> Option<&Level> {
        self.levels
            .binary_search_by_key(&level_number, Level::level_number)
            .ok()
            .map(|idx| &self.levels[idx])
    }

    /// The level one deeper than `level_number`, if the hierarchy has it.
    pub fn next_after(&self, level_number: u32) -> Option<&Level> {
        level_number
            .checked_add(1)
            .and_then(|next| self.by_number(next))
    }
}
