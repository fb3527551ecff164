//! Strata - hierarchy-aware graph editing engine.
//!
//! Keeps a rendered view in step with an editable domain graph, lays it out
//! with pluggable algorithms, and drives the interactions that classify nodes
//! into hierarchy levels:
//!
//! - [`sync`] turns the domain graph into a validated element set and a
//!   minimal diff against what is on screen.
//! - [`layout`] positions an element set with a registered algorithm,
//!   caching results per algorithm.
//! - [`menu`] builds context menus for the background, a node or a selection.
//! - [`hierarchy`] and [`assign`] track the active hierarchy and move nodes
//!   between its levels.
//!
//! [`EditingSession`] ties these together for one open graph.
//!
//! # Examples
//!
//! ```rust
//! use strata::{EditingSession, config::LayoutConfig, render::MemoryBackend};
//! use strata::domain::{DomainEdge, DomainGraph, DomainNode, GraphData};
//!
//! let graph = DomainGraph::from_data(GraphData {
//!     nodes: vec![DomainNode::new("a", "concept"), DomainNode::new("b", "concept")],
//!     edges: vec![DomainEdge::structural("a", "b")],
//! });
//!
//! let mut session = EditingSession::new(MemoryBackend::new(), &LayoutConfig::default());
//! let report = session.load_graph(graph);
//!
//! assert_eq!(session.elements().edges_count(), 1);
//! assert_eq!(report.layout.map(|outcome| outcome.positions.len()), Some(2));
//! ```

pub mod assign;
pub mod config;
pub mod dnd;
pub mod hierarchy;
pub mod layout;
pub mod menu;
pub mod render;
pub mod session;
pub mod sync;

mod error;

pub use strata_core::{domain, element, geometry, identifier};

pub use error::StrataError;
pub use session::{ActionOutcome, EditingSession, RefreshReport};
