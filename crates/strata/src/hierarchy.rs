//! Active hierarchy tracking.
//!
//! Switching hierarchies starts a levels fetch. The fetch itself is performed
//! by the shell (it may be a network round-trip); this module only hands out
//! a [`LevelsRequest`] ticket and accepts the answer later. Every switch bumps
//! a generation counter, so an answer for a superseded ticket is recognised and
//! dropped instead of overwriting the levels of the hierarchy now active.
//!
//! While a fetch is pending the active hierarchy reports zero levels, which
//! makes every level-gated affordance fail closed.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Deserialize;

use strata_core::identifier::Id;

pub use strata_core::hierarchy::{Hierarchy, Level, Levels, LevelsError};

/// An async answer that belongs to a context the user has since left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("result for hierarchy `{hierarchy_id}` arrived after the active hierarchy changed")]
pub struct StaleContextDiscarded {
    pub hierarchy_id: Id,
}

/// Failure reported by a [`HierarchyProvider`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("unknown hierarchy `{0}`")]
    UnknownHierarchy(Id),

    #[error("unknown level `{level_id}` in hierarchy `{hierarchy_id}`")]
    UnknownLevel { hierarchy_id: Id, level_id: Id },

    #[error("hierarchy provider unavailable: {0}")]
    Unavailable(String),
}

/// Why an answered levels fetch was not applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelsFetchError {
    #[error(transparent)]
    Stale(#[from] StaleContextDiscarded),

    #[error("failed to fetch levels for hierarchy `{hierarchy_id}`: {source}")]
    Provider {
        hierarchy_id: Id,
        source: ProviderError,
    },

    #[error("hierarchy `{hierarchy_id}` has invalid levels: {source}")]
    Invalid {
        hierarchy_id: Id,
        source: LevelsError,
    },
}

/// Source of hierarchy levels.
pub trait HierarchyProvider {
    /// Levels of `hierarchy_id`, in any order.
    fn get_levels(&self, hierarchy_id: Id) -> Result<Vec<Level>, ProviderError>;

    fn get_allowed_types(
        &self,
        hierarchy_id: Id,
        level_id: Id,
    ) -> Result<BTreeSet<String>, ProviderError> {
        self.get_levels(hierarchy_id)?
            .into_iter()
            .find(|level| level.id() == level_id)
            .map(|level| level.allowed_types().clone())
            .ok_or(ProviderError::UnknownLevel {
                hierarchy_id,
                level_id,
            })
    }
}

/// Ticket for one levels fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelsRequest {
    hierarchy_id: Id,
    generation: u64,
}

impl LevelsRequest {
    pub fn hierarchy_id(&self) -> Id {
        self.hierarchy_id
    }
}

/// Read-only view of the active hierarchy handed to menu and assignment code.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyContext<'a> {
    pub hierarchy_id: Id,
    pub levels: &'a Levels,
}

#[derive(Debug, Clone, Default)]
enum Fetch {
    #[default]
    Idle,
    Pending,
    Ready,
    Failed(String),
}

/// The active hierarchy and its levels.
#[derive(Debug, Clone, Default)]
pub struct HierarchyState {
    active: Option<Id>,
    generation: u64,
    levels: Levels,
    fetch: Fetch,
}

impl HierarchyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `hierarchy_id` active and return the ticket for its levels fetch.
    ///
    /// The level list is empty until [`complete_fetch`](Self::complete_fetch)
    /// accepts an answer for this ticket.
    pub fn switch_to(&mut self, hierarchy_id: Id) -> LevelsRequest {
        self.generation += 1;
        self.active = Some(hierarchy_id);
        self.levels = Levels::empty();
        self.fetch = Fetch::Pending;
        info!(hierarchy_id:%, generation = self.generation; "Switched active hierarchy");
        LevelsRequest {
            hierarchy_id,
            generation: self.generation,
        }
    }

    /// Leave hierarchy mode. Outstanding fetches become stale.
    pub fn deactivate(&mut self) {
        self.generation += 1;
        self.active = None;
        self.levels = Levels::empty();
        self.fetch = Fetch::Idle;
        info!("Deactivated hierarchy");
    }

    /// Apply the answer to a levels fetch.
    ///
    /// # Errors
    ///
    /// - [`LevelsFetchError::Stale`] if the ticket is not the latest one; the
    ///   answer is ignored.
    /// - [`LevelsFetchError::Provider`] or [`LevelsFetchError::Invalid`] if the
    ///   fetch failed; the active hierarchy keeps an empty level list.
    pub fn complete_fetch(
        &mut self,
        request: LevelsRequest,
        result: Result<Vec<Level>, ProviderError>,
    ) -> Result<&Levels, LevelsFetchError> {
        if !self.is_current(&request) {
            debug!(
                hierarchy_id:% = request.hierarchy_id,
                generation = request.generation,
                current = self.generation;
                "Discarding stale levels fetch"
            );
            return Err(StaleContextDiscarded {
                hierarchy_id: request.hierarchy_id,
            }
            .into());
        }

        let hierarchy_id = request.hierarchy_id;
        let levels = result
            .map_err(|source| LevelsFetchError::Provider {
                hierarchy_id,
                source,
            })
            .and_then(|levels| {
                Levels::new(levels).map_err(|source| LevelsFetchError::Invalid {
                    hierarchy_id,
                    source,
                })
            });

        match levels {
            Ok(levels) => {
                info!(hierarchy_id:%, levels = levels.len(); "Levels loaded");
                self.levels = levels;
                self.fetch = Fetch::Ready;
                Ok(&self.levels)
            }
            Err(err) => {
                warn!(hierarchy_id:%, err:err; "Levels fetch failed");
                self.levels = Levels::empty();
                self.fetch = Fetch::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Whether `request` answers the question currently being asked.
    pub fn is_current(&self, request: &LevelsRequest) -> bool {
        request.generation == self.generation && self.active == Some(request.hierarchy_id)
    }

    pub fn active(&self) -> Option<Id> {
        self.active
    }

    /// Levels of the active hierarchy; empty while a fetch is pending.
    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.fetch, Fetch::Pending)
    }

    /// Message of the last failed fetch for the active hierarchy.
    pub fn last_error(&self) -> Option<&str> {
        match &self.fetch {
            Fetch::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Monotonic counter identifying the current hierarchy context.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `None` when no hierarchy is active.
    pub fn context(&self) -> Option<HierarchyContext<'_>> {
        self.active.map(|hierarchy_id| HierarchyContext {
            hierarchy_id,
            levels: &self.levels,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HierarchyDocument {
    #[serde(flatten)]
    hierarchy: Hierarchy,
    #[serde(default)]
    levels: Vec<Level>,
}

/// In-memory provider, typically loaded from a JSON document of the form
/// `[{"id": .., "name": .., "levels": [..]}]`.
#[derive(Debug, Clone, Default)]
pub struct StaticHierarchies {
    hierarchies: IndexMap<Id, (Hierarchy, Vec<Level>)>,
}

impl StaticHierarchies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        let documents: Vec<HierarchyDocument> = serde_json::from_str(source)?;
        let mut provider = Self::new();
        for document in documents {
            provider.insert(document.hierarchy, document.levels);
        }
        Ok(provider)
    }

    pub fn insert(&mut self, hierarchy: Hierarchy, levels: Vec<Level>) {
        self.hierarchies.insert(hierarchy.id(), (hierarchy, levels));
    }

    pub fn hierarchies(&self) -> impl Iterator<Item = &Hierarchy> {
        self.hierarchies.values().map(|(hierarchy, _)| hierarchy)
    }

    /// The first hierarchy in document order.
    pub fn first(&self) -> Option<&Hierarchy> {
        self.hierarchies().next()
    }
}

impl HierarchyProvider for StaticHierarchies {
    fn get_levels(&self, hierarchy_id: Id) -> Result<Vec<Level>, ProviderError> {
        self.hierarchies
            .get(&hierarchy_id)
            .map(|(_, levels)| levels.clone())
            .ok_or(ProviderError::UnknownHierarchy(hierarchy_id))
    }
}
