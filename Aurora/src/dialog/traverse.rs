//! Link-aware traversal
//!
//! Conversations are graphs, not trees: a link pointer may refer to any
//! node, including an ancestor of its owner. Traversal treats link edges
//! as terminal. It reports the edge and its target but never expands the
//! target's own pointers from there. Each node is also expanded at most
//! once, so every edge is visited at most once and a walk over any
//! document terminates in time proportional to its edge count.

use serde::Serialize;

use super::types::{Dialog, DialogNode, NodeKind, NodeRef, Pointer, StartPointer};
use crate::formats::gff::ResRef;

/// The edge a traversal step arrived by.
#[derive(Debug, Clone, Copy)]
pub enum Edge<'a> {
    Start {
        /// Position in the start list
        index: usize,
        start: &'a StartPointer,
    },
    Pointer {
        owner: NodeRef,
        /// Position in the owner's pointer list
        index: usize,
        pointer: &'a Pointer,
    },
}

impl<'a> Edge<'a> {
    #[must_use]
    pub fn target(&self) -> NodeRef {
        match self {
            Self::Start { start, .. } => NodeRef::entry(start.target as usize),
            Self::Pointer { owner, pointer, .. } => {
                NodeRef::new(owner.kind.other(), pointer.target as usize)
            }
        }
    }

    #[must_use]
    pub fn is_link(&self) -> bool {
        matches!(self, Self::Pointer { pointer, .. } if pointer.is_link)
    }

    #[must_use]
    pub fn condition_script(&self) -> &'a ResRef {
        match *self {
            Self::Start { start, .. } => &start.condition_script,
            Self::Pointer { pointer, .. } => &pointer.condition_script,
        }
    }

    /// The owning node, `None` for start edges.
    #[must_use]
    pub fn owner(&self) -> Option<NodeRef> {
        match self {
            Self::Start { .. } => None,
            Self::Pointer { owner, .. } => Some(*owner),
        }
    }
}

/// Why a step was not expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// The edge is a link pointer.
    Link,
    /// The target was already expanded through another owning edge.
    AlreadyExpanded,
    /// The target index is out of range.
    Dangling,
}

/// One visited edge.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub edge: Edge<'a>,
    pub target: NodeRef,
    /// The target node, `None` when the edge dangles.
    pub node: Option<&'a DialogNode>,
    /// 0 for start edges, owner depth + 1 otherwise.
    pub depth: usize,
    pub terminal: Option<TerminalReason>,
}

impl Step<'_> {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }
}

/// A lazy depth-first walk from one or more start pointers.
///
/// Steps come out in display order: each start, then its subtree, pointers
/// in list order.
#[derive(Debug, Clone)]
pub struct Traversal<'a> {
    dialog: &'a Dialog,
    stack: Vec<(Edge<'a>, usize)>,
    expanded_entries: Vec<bool>,
    expanded_replies: Vec<bool>,
}

impl<'a> Traversal<'a> {
    fn new(dialog: &'a Dialog, starts: impl DoubleEndedIterator<Item = usize>) -> Self {
        let stack = starts
            .rev()
            .filter_map(|index| {
                dialog
                    .starts
                    .get(index)
                    .map(|start| (Edge::Start { index, start }, 0))
            })
            .collect();
        Self {
            dialog,
            stack,
            expanded_entries: vec![false; dialog.entries.len()],
            expanded_replies: vec![false; dialog.replies.len()],
        }
    }

    /// Whether `node` has been expanded so far.
    #[must_use]
    pub fn is_expanded(&self, node: NodeRef) -> bool {
        let expanded = match node.kind {
            NodeKind::Entry => &self.expanded_entries,
            NodeKind::Reply => &self.expanded_replies,
        };
        expanded.get(node.index).copied().unwrap_or(false)
    }

    fn mark_expanded(&mut self, node: NodeRef) {
        let expanded = match node.kind {
            NodeKind::Entry => &mut self.expanded_entries,
            NodeKind::Reply => &mut self.expanded_replies,
        };
        if let Some(slot) = expanded.get_mut(node.index) {
            *slot = true;
        }
    }
}

impl<'a> Iterator for Traversal<'a> {
    type Item = Step<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (edge, depth) = self.stack.pop()?;
        let target = edge.target();
        let node = self.dialog.node(target);

        let terminal = match node {
            None => Some(TerminalReason::Dangling),
            Some(_) if edge.is_link() => Some(TerminalReason::Link),
            Some(_) if self.is_expanded(target) => Some(TerminalReason::AlreadyExpanded),
            Some(_) => None,
        };

        if let (None, Some(expanded)) = (terminal, node) {
            self.mark_expanded(target);
            for (index, pointer) in expanded.pointers.iter().enumerate().rev() {
                self.stack.push((
                    Edge::Pointer {
                        owner: target,
                        index,
                        pointer,
                    },
                    depth + 1,
                ));
            }
        }

        Some(Step {
            edge,
            target,
            node,
            depth,
            terminal,
        })
    }
}

/// Walk from a single start pointer. An out-of-range start yields nothing.
#[must_use]
pub fn traverse(dialog: &Dialog, start: usize) -> Traversal<'_> {
    Traversal::new(dialog, std::iter::once(start))
}

/// Counts gathered by walking every start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DialogStats {
    pub entries: usize,
    pub replies: usize,
    pub starts: usize,
    /// Edges visited, start edges included
    pub edges: usize,
    pub links: usize,
    pub dangling: usize,
    pub max_depth: usize,
    /// Nodes no start reaches through owning edges
    pub unreachable: usize,
}

impl Dialog {
    /// Walk from one start pointer.
    #[must_use]
    pub fn traverse(&self, start: usize) -> Traversal<'_> {
        traverse(self, start)
    }

    /// Walk from every start pointer in order, sharing one expanded set.
    #[must_use]
    pub fn traverse_all(&self) -> Traversal<'_> {
        Traversal::new(self, 0..self.starts.len())
    }

    #[must_use]
    pub fn stats(&self) -> DialogStats {
        let mut walk = self.traverse_all();
        let mut stats = DialogStats {
            entries: self.entries.len(),
            replies: self.replies.len(),
            starts: self.starts.len(),
            ..DialogStats::default()
        };
        for step in walk.by_ref() {
            stats.edges += 1;
            stats.max_depth = stats.max_depth.max(step.depth);
            match step.terminal {
                Some(TerminalReason::Link) => stats.links += 1,
                Some(TerminalReason::Dangling) => stats.dangling += 1,
                _ => {}
            }
        }
        stats.unreachable = unexpanded(self, &walk).count();
        stats
    }

    /// Nodes no start reaches through owning edges, entries first.
    #[must_use]
    pub fn unreachable(&self) -> Vec<NodeRef> {
        let mut walk = self.traverse_all();
        walk.by_ref().for_each(drop);
        unexpanded(self, &walk).collect()
    }
}

fn unexpanded<'w>(dialog: &Dialog, walk: &'w Traversal<'_>) -> impl Iterator<Item = NodeRef> + 'w {
    let entries = (0..dialog.entries.len()).map(NodeRef::entry);
    let replies = (0..dialog.replies.len()).map(NodeRef::reply);
    entries.chain(replies).filter(move |node| !walk.is_expanded(*node))
}
