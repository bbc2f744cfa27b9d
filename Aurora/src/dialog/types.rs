//! Conversation data types
//!
//! A [`Dialog`] owns flat, index-addressed lists of entries (NPC lines),
//! replies (player lines) and start pointers. Every cross-reference is a
//! plain index into those lists, so links back to earlier nodes never form
//! an ownership cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::formats::gff::{GffField, LocString, ResRef};

/// Whether a node is spoken by the NPC or chosen by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// NPC line
    Entry,
    /// Player line
    Reply,
}

impl NodeKind {
    /// The kind pointers from this kind lead to.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Entry => Self::Reply,
            Self::Reply => Self::Entry,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Reply => "reply",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a node: its kind and its index in that kind's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    pub kind: NodeKind,
    pub index: usize,
}

impl NodeRef {
    #[must_use]
    pub fn new(kind: NodeKind, index: usize) -> Self {
        Self { kind, index }
    }

    #[must_use]
    pub fn entry(index: usize) -> Self {
        Self::new(NodeKind::Entry, index)
    }

    #[must_use]
    pub fn reply(index: usize) -> Self {
        Self::new(NodeKind::Reply, index)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.index)
    }
}

/// A conversation document
#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    /// Word count shown by the toolset
    pub num_words: u32,
    /// Delay before each entry, in milliseconds
    pub delay_entry: u32,
    /// Delay before each reply, in milliseconds
    pub delay_reply: u32,
    /// Script run when the conversation ends normally
    pub end_conversation: ResRef,
    /// Script run when the conversation is aborted
    pub end_conver_abort: ResRef,
    /// Keep the camera from zooming in on the speaker
    pub prevent_zoom_in: bool,
    /// NPC lines
    pub entries: Vec<DialogNode>,
    /// Player lines
    pub replies: Vec<DialogNode>,
    /// Entry points into `entries`
    pub starts: Vec<StartPointer>,
    /// Root fields this crate does not interpret, in file order
    pub extra_fields: Vec<GffField>,
    /// Root field layout as decoded
    pub field_order: FieldOrder,
}

impl Default for Dialog {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            num_words: 0,
            delay_entry: 0,
            delay_reply: 0,
            end_conversation: ResRef::default(),
            end_conver_abort: ResRef::default(),
            prevent_zoom_in: false,
            entries: Vec::new(),
            replies: Vec::new(),
            starts: Vec::new(),
            extra_fields: Vec::new(),
            field_order: FieldOrder::default(),
        }
    }

    /// The node list of one kind.
    #[must_use]
    pub fn nodes(&self, kind: NodeKind) -> &[DialogNode] {
        match kind {
            NodeKind::Entry => &self.entries,
            NodeKind::Reply => &self.replies,
        }
    }

    pub fn nodes_mut(&mut self, kind: NodeKind) -> &mut Vec<DialogNode> {
        match kind {
            NodeKind::Entry => &mut self.entries,
            NodeKind::Reply => &mut self.replies,
        }
    }

    #[must_use]
    pub fn node(&self, node: NodeRef) -> Option<&DialogNode> {
        self.nodes(node.kind).get(node.index)
    }

    pub fn node_mut(&mut self, node: NodeRef) -> Option<&mut DialogNode> {
        self.nodes_mut(node.kind).get_mut(node.index)
    }

    /// Append a node, returning its identity.
    pub fn push_node(&mut self, kind: NodeKind, node: DialogNode) -> NodeRef {
        let nodes = self.nodes_mut(kind);
        nodes.push(node);
        NodeRef::new(kind, nodes.len() - 1)
    }

    /// Entries plus replies.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.entries.len() + self.replies.len()
    }

    /// Every pointer in the document, with its owner and position.
    pub fn pointers(&self) -> impl Iterator<Item = (NodeRef, usize, &Pointer)> {
        [NodeKind::Entry, NodeKind::Reply].into_iter().flat_map(move |kind| {
            self.nodes(kind).iter().enumerate().flat_map(move |(index, node)| {
                node.pointers
                    .iter()
                    .enumerate()
                    .map(move |(position, pointer)| (NodeRef::new(kind, index), position, pointer))
            })
        })
    }
}

/// An entry or reply
#[derive(Debug, Clone, PartialEq)]
pub struct DialogNode {
    /// Speaker tag; empty means the conversation owner. Entries only.
    pub speaker: String,
    /// Spoken text
    pub text: LocString,
    /// Designer comment
    pub comment: String,
    /// Script run when the node is shown
    pub script: ResRef,
    /// Parameters passed to `script`, when the file carries them
    pub action_params: Option<ParameterList>,
    /// Animation id
    pub animation: u32,
    /// Loop the animation
    pub anim_loop: bool,
    /// Display delay; `u32::MAX` means the document default
    pub delay: u32,
    /// Voice-over sound
    pub sound: ResRef,
    /// Journal quest tag
    pub quest: String,
    /// Journal entry id, when the file carries one
    pub quest_entry: Option<u32>,
    /// Outgoing edges, in display order
    pub pointers: Vec<Pointer>,
    /// Fields this crate does not interpret, in file order
    pub extra_fields: Vec<GffField>,
    pub field_order: FieldOrder,
}

impl Default for DialogNode {
    fn default() -> Self {
        Self {
            speaker: String::new(),
            text: LocString::default(),
            comment: String::new(),
            script: ResRef::default(),
            action_params: None,
            animation: 0,
            anim_loop: false,
            delay: u32::MAX,
            sound: ResRef::default(),
            quest: String::new(),
            quest_entry: None,
            pointers: Vec::new(),
            extra_fields: Vec::new(),
            field_order: FieldOrder::default(),
        }
    }
}

impl DialogNode {
    /// A node with English text.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: LocString::english(text),
            ..Self::default()
        }
    }

    /// Builder-style pointer append.
    #[must_use]
    pub fn pointing_to(mut self, pointer: Pointer) -> Self {
        self.pointers.push(pointer);
        self
    }

    /// Text for display: English if present, else the first language, else
    /// the string-table reference.
    #[must_use]
    pub fn display_text(&self) -> String {
        if let Some(text) = self.text.get(0).or_else(|| self.text.first_text()) {
            return text.to_string();
        }
        match self.text.strref {
            Some(strref) => format!("<StrRef:{strref}>"),
            None => String::new(),
        }
    }
}

/// An edge from an entry to a reply or from a reply to an entry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pointer {
    /// Index into the other kind's node list
    pub target: u32,
    /// The edge refers to a node owned elsewhere and is not expanded
    pub is_link: bool,
    /// Comment shown on link edges, when the file carries one
    pub link_comment: Option<String>,
    /// Script that must return true for the edge to be offered
    pub condition_script: ResRef,
    /// Parameters passed to `condition_script`, when the file carries them
    pub condition_params: Option<ParameterList>,
    /// Fields this crate does not interpret, in file order
    pub extra_fields: Vec<GffField>,
    pub field_order: FieldOrder,
}

impl Pointer {
    /// An owning edge.
    #[must_use]
    pub fn to(target: u32) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// A link edge.
    #[must_use]
    pub fn link(target: u32) -> Self {
        Self {
            target,
            is_link: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_condition(mut self, script: ResRef) -> Self {
        self.condition_script = script;
        self
    }
}

/// An entry point into the entry list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartPointer {
    /// Index into the entry list
    pub target: u32,
    pub condition_script: ResRef,
    pub condition_params: Option<ParameterList>,
    pub extra_fields: Vec<GffField>,
    pub field_order: FieldOrder,
}

impl StartPointer {
    #[must_use]
    pub fn new(target: u32) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }
}

/// One key/value script parameter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameter {
    pub key: String,
    pub value: String,
    pub extra_fields: Vec<GffField>,
    pub field_order: FieldOrder,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            extra_fields: Vec::new(),
            field_order: FieldOrder::default(),
        }
    }
}

/// Field labels of a decoded struct, in file order.
///
/// The builder writes a struct's fields in this order and writes only the
/// fields it lists, plus any the caller has since given a value. Structs
/// created in code carry no recorded order and get the default layout.
///
/// Layout is not content: every `FieldOrder` compares equal, so two
/// documents that differ only in field layout are equal.
#[derive(Debug, Clone, Default)]
pub struct FieldOrder(Option<Vec<String>>);

impl FieldOrder {
    #[must_use]
    pub fn recorded(labels: Vec<String>) -> Self {
        Self(Some(labels))
    }

    /// The recorded labels, or `None` for a struct built in code.
    #[must_use]
    pub fn labels(&self) -> Option<&[String]> {
        self.0.as_deref()
    }

    #[must_use]
    pub fn is_recorded(&self) -> bool {
        self.0.is_some()
    }
}

impl PartialEq for FieldOrder {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

/// Ordered script parameters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterList(pub Vec<Parameter>);

impl ParameterList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push(Parameter::new(key, value));
    }

    /// Value of the first parameter with the given key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|p| p.key == key).map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Parameter> for ParameterList {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
