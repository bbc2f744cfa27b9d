//! Export functionality for dialogs

use std::fmt::Write;

use serde::Serialize;

use super::traverse::{Edge, Step, TerminalReason};
use super::types::{Dialog, DialogNode, NodeKind, NodeRef};

/// Render an indented text outline of the conversation.
///
/// Link edges are shown but not expanded, so the outline is finite for any
/// document.
#[must_use]
pub fn render_tree(dialog: &Dialog) -> String {
    let mut out = String::new();
    for step in dialog.traverse_all() {
        let _ = writeln!(out, "{}{}", "  ".repeat(step.depth), outline_line(&step));
    }
    out
}

fn outline_line(step: &Step<'_>) -> String {
    let mut line = match step.edge {
        Edge::Start { index, .. } => format!("[start {index}] "),
        Edge::Pointer { .. } => String::new(),
    };

    match (step.terminal, step.node) {
        (Some(TerminalReason::Dangling), _) | (_, None) => {
            let _ = write!(line, "-> {} (missing)", step.target);
        }
        (Some(TerminalReason::Link), Some(node)) => {
            let text = quoted_text(step.target.kind, node);
            let _ = write!(line, "-> {} (link): {text}", step.target);
            if let Edge::Pointer { pointer, .. } = step.edge
                && let Some(comment) = &pointer.link_comment
                && !comment.is_empty()
            {
                let _ = write!(line, " // {comment}");
            }
        }
        (Some(TerminalReason::AlreadyExpanded), Some(_)) => {
            let _ = write!(line, "-> {} (see above)", step.target);
        }
        (None, Some(node)) => {
            let _ = write!(line, "{}", step.target);
            if !node.speaker.is_empty() {
                let _ = write!(line, " [{}]", node.speaker);
            }
            let _ = write!(line, ": {}", quoted_text(step.target.kind, node));
            if !node.script.is_empty() {
                let _ = write!(line, " !{}", node.script);
            }
        }
    }

    let condition = step.edge.condition_script();
    if !condition.is_empty() {
        let _ = write!(line, " ?{condition}");
    }
    line
}

fn placeholder(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Entry => "[END DIALOG]",
        NodeKind::Reply => "[CONTINUE]",
    }
}

fn plain_text(kind: NodeKind, node: &DialogNode) -> String {
    let text = node.display_text();
    if text.is_empty() {
        placeholder(kind).to_string()
    } else {
        text
    }
}

fn quoted_text(kind: NodeKind, node: &DialogNode) -> String {
    let text = node.display_text();
    if text.is_empty() {
        placeholder(kind).to_string()
    } else {
        format!("\"{text}\"")
    }
}

/// Node category in a flow-chart export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureNodeType {
    Root,
    Npc,
    Pc,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: StructureNodeType,
    pub text: String,
    pub speaker: String,
    pub has_action: bool,
    pub has_condition: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_script: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_link: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureLink {
    pub source: String,
    pub target: String,
    pub has_condition: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_script: Option<String>,
}

/// A nodes-and-links view of a conversation for flow-chart consumers.
///
/// Every entry and reply becomes a node. Each link pointer becomes its own
/// `link` node naming its target, so the link graph stays acyclic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DialogStructure {
    pub nodes: Vec<StructureNode>,
    pub links: Vec<StructureLink>,
}

/// Flow-chart id of a node.
#[must_use]
pub fn node_id(node: NodeRef) -> String {
    match node.kind {
        NodeKind::Entry => format!("npc_{}", node.index),
        NodeKind::Reply => format!("pc_{}", node.index),
    }
}

/// Build the flow-chart structure of a conversation.
#[must_use]
pub fn structure(dialog: &Dialog) -> DialogStructure {
    let mut out = DialogStructure::default();
    out.nodes.push(StructureNode {
        id: "root".to_string(),
        node_type: StructureNodeType::Root,
        text: "Dialog Start".to_string(),
        speaker: String::new(),
        has_action: false,
        has_condition: false,
        action_script: None,
        condition_script: None,
        is_link: false,
        link_target: None,
    });

    let first_node = out.nodes.len();
    for kind in [NodeKind::Entry, NodeKind::Reply] {
        for (index, node) in dialog.nodes(kind).iter().enumerate() {
            out.nodes.push(StructureNode {
                id: node_id(NodeRef::new(kind, index)),
                node_type: match kind {
                    NodeKind::Entry => StructureNodeType::Npc,
                    NodeKind::Reply => StructureNodeType::Pc,
                },
                text: plain_text(kind, node),
                speaker: node.speaker.clone(),
                has_action: !node.script.is_empty(),
                has_condition: false,
                action_script: (!node.script.is_empty()).then(|| node.script.to_string()),
                condition_script: None,
                is_link: false,
                link_target: None,
            });
        }
    }
    let position = |node: NodeRef| match node.kind {
        NodeKind::Entry => first_node + node.index,
        NodeKind::Reply => first_node + dialog.entries.len() + node.index,
    };

    let mut link_count = 0;
    for step in dialog.traverse_all() {
        let Some(target) = step.node else {
            continue;
        };
        let source = step.edge.owner().map_or_else(|| "root".to_string(), node_id);
        let condition = step.edge.condition_script();
        let condition_script = (!condition.is_empty()).then(|| condition.to_string());

        let target_id = if step.terminal == Some(TerminalReason::Link) {
            link_count += 1;
            let id = format!("link_{link_count}");
            out.nodes.push(StructureNode {
                id: id.clone(),
                node_type: StructureNodeType::Link,
                text: format!("-> {}", plain_text(step.target.kind, target)),
                speaker: String::new(),
                has_action: false,
                has_condition: condition_script.is_some(),
                action_script: None,
                condition_script: condition_script.clone(),
                is_link: true,
                link_target: Some(node_id(step.target)),
            });
            id
        } else {
            if step.terminal.is_none() && condition_script.is_some() {
                let node = &mut out.nodes[position(step.target)];
                node.has_condition = true;
                node.condition_script.clone_from(&condition_script);
            }
            node_id(step.target)
        };

        out.links.push(StructureLink {
            source,
            target: target_id,
            has_condition: condition_script.is_some(),
            condition_script,
        });
    }
    out
}
