//! [`Dialog`] → struct tree mapping
//!
//! Only field content is decided here. Struct numbering, type codes and
//! section placement are left to the compatibility policy.

use super::parser::pointer_list_label;
use super::types::{
    Dialog, DialogNode, FieldOrder, NodeKind, Parameter, ParameterList, Pointer, StartPointer,
};
use crate::formats::gff::{FieldValue, GffField, GffStruct, LocString};

/// Build the struct tree for a conversation.
///
/// A decoded struct is written with its recorded field order and only the
/// fields it held, plus any mapped field the caller has since given a
/// value. A struct built in code gets every mapped field in a fixed order.
/// Preserved extra fields follow wherever the recorded order does not
/// place them. Optional fields are written only when present.
#[must_use]
pub fn dialog_to_tree(dialog: &Dialog) -> GffStruct {
    let entries = dialog
        .entries
        .iter()
        .map(|n| node_struct(NodeKind::Entry, n))
        .collect();
    let replies = dialog
        .replies
        .iter()
        .map(|n| node_struct(NodeKind::Reply, n))
        .collect();
    let starts = dialog.starts.iter().map(start_struct).collect();

    let known = vec![
        Known::new(
            "DelayEntry",
            FieldValue::Dword(dialog.delay_entry),
            dialog.delay_entry != 0,
        ),
        Known::new(
            "DelayReply",
            FieldValue::Dword(dialog.delay_reply),
            dialog.delay_reply != 0,
        ),
        Known::new(
            "EndConversation",
            FieldValue::ResRef(dialog.end_conversation.clone()),
            !dialog.end_conversation.is_empty(),
        ),
        Known::new(
            "EndConverAbort",
            FieldValue::ResRef(dialog.end_conver_abort.clone()),
            !dialog.end_conver_abort.is_empty(),
        ),
        Known::new(
            "NumWords",
            FieldValue::Dword(dialog.num_words),
            dialog.num_words != 0,
        ),
        Known::new(
            "PreventZoomIn",
            FieldValue::Byte(u8::from(dialog.prevent_zoom_in)),
            dialog.prevent_zoom_in,
        ),
        Known::new("EntryList", FieldValue::List(entries), true),
        Known::new("ReplyList", FieldValue::List(replies), true),
        Known::new("StartingList", FieldValue::List(starts), true),
    ];
    assemble(
        GffStruct::root(),
        &dialog.field_order,
        known,
        &dialog.extra_fields,
    )
}

/// A mapped field the builder may write.
struct Known {
    label: &'static str,
    value: FieldValue,
    /// Holds something other than the value an absent field decodes to.
    set: bool,
}

impl Known {
    fn new(label: &'static str, value: FieldValue, set: bool) -> Self {
        Self { label, value, set }
    }
}

/// Lay out a struct's fields.
///
/// Without a recorded order every candidate is written in the order given,
/// then the extras. With one, recorded labels are filled from the
/// candidates first and from unused extras second; a label neither can
/// supply was removed and is skipped. Candidates the source lacked are
/// appended only when set, followed by the remaining extras.
fn assemble(
    mut s: GffStruct,
    order: &FieldOrder,
    known: Vec<Known>,
    extras: &[GffField],
) -> GffStruct {
    let Some(recorded) = order.labels() else {
        s.fields
            .extend(known.into_iter().map(|k| GffField::new(k.label, k.value)));
        s.fields.extend(extras.iter().cloned());
        return s;
    };

    let mut known: Vec<Option<Known>> = known.into_iter().map(Some).collect();
    let mut extras: Vec<Option<&GffField>> = extras.iter().map(Some).collect();
    for label in recorded {
        let candidate = known
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|k| k.label == label.as_str()))
            .and_then(Option::take);
        if let Some(k) = candidate {
            s.push(k.label, k.value);
            continue;
        }
        let extra = extras
            .iter_mut()
            .find(|slot| slot.is_some_and(|f| f.label == *label))
            .and_then(Option::take);
        if let Some(field) = extra {
            s.fields.push(field.clone());
        }
    }
    s.fields.extend(
        known
            .into_iter()
            .flatten()
            .filter(|k| k.set)
            .map(|k| GffField::new(k.label, k.value)),
    );
    s.fields.extend(extras.into_iter().flatten().cloned());
    s
}

fn node_struct(kind: NodeKind, node: &DialogNode) -> GffStruct {
    let mut known = Vec::with_capacity(12);
    if kind == NodeKind::Entry {
        known.push(Known::new(
            "Speaker",
            FieldValue::String(node.speaker.clone()),
            !node.speaker.is_empty(),
        ));
    }
    known.push(Known::new(
        "AnimLoop",
        FieldValue::Byte(u8::from(node.anim_loop)),
        node.anim_loop,
    ));
    known.push(Known::new(
        "Animation",
        FieldValue::Dword(node.animation),
        node.animation != 0,
    ));
    known.push(Known::new(
        "Text",
        FieldValue::LocString(node.text.clone()),
        node.text != LocString::default(),
    ));
    known.push(Known::new(
        "Script",
        FieldValue::ResRef(node.script.clone()),
        !node.script.is_empty(),
    ));
    if let Some(params) = &node.action_params {
        known.push(Known::new("ActionParams", params_list(params), true));
    }
    known.push(Known::new(
        "Delay",
        FieldValue::Dword(node.delay),
        node.delay != u32::MAX,
    ));
    known.push(Known::new(
        "Comment",
        FieldValue::String(node.comment.clone()),
        !node.comment.is_empty(),
    ));
    known.push(Known::new(
        "Sound",
        FieldValue::ResRef(node.sound.clone()),
        !node.sound.is_empty(),
    ));
    known.push(Known::new(
        "Quest",
        FieldValue::String(node.quest.clone()),
        !node.quest.is_empty(),
    ));
    if let Some(entry) = node.quest_entry {
        known.push(Known::new("QuestEntry", FieldValue::Dword(entry), true));
    }
    known.push(Known::new(
        pointer_list_label(kind),
        FieldValue::List(node.pointers.iter().map(pointer_struct).collect()),
        !node.pointers.is_empty(),
    ));
    assemble(
        GffStruct::new(0),
        &node.field_order,
        known,
        &node.extra_fields,
    )
}

fn pointer_struct(pointer: &Pointer) -> GffStruct {
    let mut known = vec![
        Known::new("Index", FieldValue::Dword(pointer.target), true),
        Known::new(
            "Active",
            FieldValue::ResRef(pointer.condition_script.clone()),
            !pointer.condition_script.is_empty(),
        ),
    ];
    if let Some(params) = &pointer.condition_params {
        known.push(Known::new("ConditionParams", params_list(params), true));
    }
    known.push(Known::new(
        "IsChild",
        FieldValue::Byte(u8::from(pointer.is_link)),
        pointer.is_link,
    ));
    if let Some(comment) = &pointer.link_comment {
        known.push(Known::new(
            "LinkComment",
            FieldValue::String(comment.clone()),
            true,
        ));
    }
    assemble(
        GffStruct::new(0),
        &pointer.field_order,
        known,
        &pointer.extra_fields,
    )
}

fn start_struct(start: &StartPointer) -> GffStruct {
    let mut known = vec![
        Known::new("Index", FieldValue::Dword(start.target), true),
        Known::new(
            "Active",
            FieldValue::ResRef(start.condition_script.clone()),
            !start.condition_script.is_empty(),
        ),
    ];
    if let Some(params) = &start.condition_params {
        known.push(Known::new("ConditionParams", params_list(params), true));
    }
    assemble(
        GffStruct::new(0),
        &start.field_order,
        known,
        &start.extra_fields,
    )
}

fn params_list(params: &ParameterList) -> FieldValue {
    FieldValue::List(params.iter().map(param_struct).collect())
}

fn param_struct(p: &Parameter) -> GffStruct {
    let known = vec![
        Known::new("Key", FieldValue::String(p.key.clone()), !p.key.is_empty()),
        Known::new(
            "Value",
            FieldValue::String(p.value.clone()),
            !p.value.is_empty(),
        ),
    ];
    assemble(GffStruct::new(0), &p.field_order, known, &p.extra_fields)
}
