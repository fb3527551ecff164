//! Drag-and-drop transfer payloads.
//!
//! The shell hands over the raw transfer string. Only payloads tagged
//! `"sourceType": "graph-node"` mean anything here; every other shape,
//! including text that is not JSON at all, parses to [`DragPayload::Unknown`]
//! and is ignored by the drop handler.

use log::trace;
use serde::{Deserialize, Serialize};

use strata_core::{domain::DomainNode, identifier::Id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sourceType")]
pub enum DragPayload {
    #[serde(rename = "graph-node", rename_all = "camelCase")]
    GraphNode {
        node_id: Id,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_data: Option<DomainNode>,
    },

    #[serde(other)]
    Unknown,
}

impl DragPayload {
    pub fn graph_node(node_id: impl Into<Id>) -> Self {
        Self::GraphNode {
            node_id: node_id.into(),
            node_data: None,
        }
    }

    /// Parse a transfer string. Never fails.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|err| {
            trace!(err:err; "Ignoring unrecognised drag payload");
            Self::Unknown
        })
    }

    /// The dragged node, for graph-node payloads.
    pub fn node_id(&self) -> Option<Id> {
        match self {
            Self::GraphNode { node_id, .. } => Some(*node_id),
            Self::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_node_payload() {
        let payload = DragPayload::parse(
            r#"{"sourceType": "graph-node", "nodeId": "n1", "nodeData": {"id": "n1", "type": "concept"}}"#,
        );

        match payload {
            DragPayload::GraphNode { node_id, node_data } => {
                assert_eq!(node_id, "n1");
                assert_eq!(node_data.unwrap().node_type(), "concept");
            }
            DragPayload::Unknown => panic!("expected a graph-node payload"),
        }
    }

    #[test]
    fn test_anything_else_is_unknown() {
        assert_eq!(DragPayload::parse(r#"{"sourceType": "file"}"#), DragPayload::Unknown);
        assert_eq!(DragPayload::parse("plain text"), DragPayload::Unknown);
        assert_eq!(DragPayload::parse(r#"{"nodeId": "n1"}"#), DragPayload::Unknown);
        assert_eq!(
            DragPayload::parse(r#"{"sourceType": "graph-node"}"#),
            DragPayload::Unknown
        );
    }

    #[test]
    fn test_serializes_with_tag() {
        let json = serde_json::to_string(&DragPayload::graph_node("n1")).unwrap();
        assert_eq!(json, r#"{"sourceType":"graph-node","nodeId":"n1"}"#);
        assert_eq!(DragPayload::parse(&json).node_id(), Some(Id::new("n1")));
    }
}
