//! CLI logic for the Strata graph tool.
//!
//! Loads a graph (and optionally a hierarchy document), drives an
//! [`EditingSession`] through the requested hides, assignments and layout, and
//! writes a JSON snapshot of the resulting render state.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write},
};

use log::{debug, info, warn};
use serde::Serialize;

use strata::{
    EditingSession, StrataError,
    assign::{AssignmentBackend, PersistenceError},
    domain::{DomainGraph, DomainNode, GraphData},
    element::RenderElement,
    hierarchy::{Level, ProviderError, StaticHierarchies},
    identifier::Id,
    layout::LayoutOutcome,
    menu::{MenuDescriptor, MenuTarget},
    render::MemoryBackend,
    sync::SyncDiagnostics,
};

/// JSON document written by [`run`].
#[derive(Serialize)]
struct Snapshot<'a> {
    algorithm: &'a str,
    elements: Vec<RenderElement<'a>>,
    diagnostics: &'a SyncDiagnostics,
    layout: Option<&'a LayoutOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hierarchy: Option<HierarchySummary<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    menu: Option<MenuDescriptor>,
    /// The domain graph after assignments, in input format.
    graph: GraphData,
}

#[derive(Serialize)]
struct HierarchySummary<'a> {
    id: Id,
    levels: Vec<&'a Level>,
}

/// Accepts every assignment; the result is written with the snapshot.
struct SnapshotStore;

impl AssignmentBackend for SnapshotStore {
    fn assign_node_to_level(
        &mut self,
        node_id: Id,
        level_id: Id,
        _snapshot: &DomainNode,
    ) -> Result<(), PersistenceError> {
        debug!(node_id:%, level_id:%; "Recording assignment");
        Ok(())
    }
}

/// Run the Strata CLI application
///
/// # Errors
///
/// Returns `StrataError` for:
/// - File I/O errors
/// - Configuration loading errors, including an unknown algorithm
/// - Malformed graph or hierarchy documents
/// - Rejected assignments
/// - Layout failures when `--strict` is set
pub fn run(args: &Args) -> Result<(), StrataError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing graph"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let mut layout_config = app_config.layout().clone();
    if let Some(algorithm) = &args.algorithm {
        layout_config = layout_config.with_algorithm(algorithm);
    }
    if args.respect_hierarchy {
        layout_config = layout_config.with_respect_hierarchy(true);
    }

    let mut session = EditingSession::new(MemoryBackend::new(), &layout_config);
    if session.algorithm() != layout_config.algorithm() {
        let known: Vec<&str> = session.layout_engine().algorithms().collect();
        return Err(StrataError::Config(format!(
            "unknown layout algorithm `{}` (available: {})",
            layout_config.algorithm(),
            known.join(", ")
        )));
    }

    let source = fs::read_to_string(&args.input)?;
    let data: GraphData = serde_json::from_str(&source)?;
    session.load_graph(DomainGraph::from_data(data));

    if let Some(path) = &args.hierarchies {
        let provider = StaticHierarchies::from_json(&fs::read_to_string(path)?)?;
        let hierarchy_id = match &args.hierarchy {
            Some(id) => Id::new(id),
            None => provider
                .first()
                .map(|hierarchy| hierarchy.id())
                .ok_or_else(|| ProviderError::Unavailable(format!("`{path}` defines no hierarchies")))?,
        };
        session.load_hierarchy(&provider, hierarchy_id)?;
        info!(hierarchy_id:%, levels = session.hierarchy().levels().len(); "Hierarchy loaded");
    }

    for raw in &args.assign {
        let (node_id, level_id) = raw.split_once('=').ok_or_else(|| {
            StrataError::Config(format!("invalid assignment `{raw}`, expected NODE_ID=LEVEL_ID"))
        })?;
        session.assign(&mut SnapshotStore, Id::new(node_id), Id::new(level_id))?;
    }

    if !args.hidden.is_empty() {
        let hidden: Vec<Id> = args.hidden.iter().map(|id| Id::new(id)).collect();
        session.hide(&hidden);
    }

    if let Some(warning) = &session.diagnostics().warning {
        warn!(warning:%; "Graph data looks inconsistent");
    }

    if let Some(failure) = session.last_layout().and_then(LayoutOutcome::failure) {
        if args.strict {
            return Err(failure.clone().into());
        }
        warn!(failure:%; "Layout failed, previous positions were kept");
    }

    let menu = args.menu_for.as_ref().map(|node_id| {
        session.context_menu(&MenuTarget::Node {
            node_id: Id::new(node_id),
        })
    });

    let snapshot = Snapshot {
        algorithm: session.algorithm(),
        elements: session.elements().elements().collect(),
        diagnostics: session.diagnostics(),
        layout: session.last_layout(),
        hierarchy: session.hierarchy().active().map(|id| HierarchySummary {
            id,
            levels: session.hierarchy().levels().iter().collect(),
        }),
        menu,
        graph: session.graph().to_data(),
    };
    let json = serde_json::to_string_pretty(&snapshot)?;

    if args.output == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
    } else {
        fs::write(&args.output, json)?;
        info!(output_file = args.output; "Snapshot written");
    }

    Ok(())
}
