//! Struct tree → [`Dialog`] mapping

use super::types::{
    Dialog, DialogNode, FieldOrder, NodeKind, NodeRef, Parameter, ParameterList, Pointer,
    StartPointer,
};
use crate::error::{Error, Result};
use crate::formats::gff::{
    FieldType, FieldValue, GffField, GffStruct, LocString, ROOT_STRUCT_TYPE, ResRef,
};

/// Map a resolved struct tree onto a conversation.
///
/// Pointer targets are not checked here; see [`super::validate`]. Each
/// mapped struct keeps its field labels in file order so an unedited
/// document is written back with the same layout.
///
/// # Errors
/// Returns a semantic error if the root type code is wrong, a required
/// field is missing, or a known field has an unexpected wire type.
pub fn dialog_from_tree(root: GffStruct) -> Result<Dialog> {
    if root.type_code != ROOT_STRUCT_TYPE {
        return Err(Error::InvalidRootType {
            found: root.type_code,
            expected: ROOT_STRUCT_TYPE,
        });
    }

    let mut reader = FieldReader::new("dialog root", root.fields);
    let mut dialog = Dialog {
        delay_entry: reader.dword("DelayEntry")?.unwrap_or(0),
        delay_reply: reader.dword("DelayReply")?.unwrap_or(0),
        end_conversation: reader.resref("EndConversation")?.unwrap_or_default(),
        end_conver_abort: reader.resref("EndConverAbort")?.unwrap_or_default(),
        num_words: reader.dword("NumWords")?.unwrap_or(0),
        prevent_zoom_in: reader.byte("PreventZoomIn")?.is_some_and(|b| b != 0),
        ..Dialog::new()
    };
    let entries = reader.required_list("EntryList")?;
    let replies = reader.required_list("ReplyList")?;
    let starts = reader.required_list("StartingList")?;
    (dialog.extra_fields, dialog.field_order) = reader.finish();

    dialog.entries = entries
        .into_iter()
        .enumerate()
        .map(|(index, s)| parse_node(NodeRef::entry(index), s))
        .collect::<Result<_>>()?;
    dialog.replies = replies
        .into_iter()
        .enumerate()
        .map(|(index, s)| parse_node(NodeRef::reply(index), s))
        .collect::<Result<_>>()?;
    dialog.starts = starts
        .into_iter()
        .enumerate()
        .map(|(index, s)| parse_start(index, s))
        .collect::<Result<_>>()?;

    tracing::debug!(
        "Mapped dialog: {} entries, {} replies, {} starts",
        dialog.entries.len(),
        dialog.replies.len(),
        dialog.starts.len()
    );
    Ok(dialog)
}

/// Label of a node's outgoing pointer list.
pub(crate) fn pointer_list_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Entry => "RepliesList",
        NodeKind::Reply => "EntriesList",
    }
}

fn parse_node(node_ref: NodeRef, s: GffStruct) -> Result<DialogNode> {
    let context = node_ref.to_string();
    let mut reader = FieldReader::new(context.clone(), s.fields);

    let speaker = match node_ref.kind {
        NodeKind::Entry => reader.string("Speaker")?.unwrap_or_default(),
        NodeKind::Reply => String::new(),
    };
    let mut node = DialogNode {
        speaker,
        text: reader.loc_string("Text")?.unwrap_or_default(),
        comment: reader.string("Comment")?.unwrap_or_default(),
        script: reader.resref("Script")?.unwrap_or_default(),
        action_params: reader
            .list("ActionParams")?
            .map(|items| parse_params(&context, "ActionParams", items))
            .transpose()?,
        animation: reader.dword("Animation")?.unwrap_or(0),
        anim_loop: reader.byte("AnimLoop")?.is_some_and(|b| b != 0),
        delay: reader.dword("Delay")?.unwrap_or(u32::MAX),
        sound: reader.resref("Sound")?.unwrap_or_default(),
        quest: reader.string("Quest")?.unwrap_or_default(),
        quest_entry: reader.dword("QuestEntry")?,
        ..DialogNode::default()
    };
    let pointers = reader
        .list(pointer_list_label(node_ref.kind))?
        .unwrap_or_default();
    (node.extra_fields, node.field_order) = reader.finish();

    node.pointers = pointers
        .into_iter()
        .enumerate()
        .map(|(position, s)| parse_pointer(&context, position, s))
        .collect::<Result<_>>()?;
    Ok(node)
}

fn parse_pointer(owner: &str, position: usize, s: GffStruct) -> Result<Pointer> {
    let context = format!("{owner} pointer {position}");
    let mut reader = FieldReader::new(context.clone(), s.fields);

    let target = reader.dword("Index")?.ok_or_else(|| reader.missing("Index"))?;
    let condition_params = reader
        .list("ConditionParams")?
        .map(|items| parse_params(&context, "ConditionParams", items))
        .transpose()?;
    let is_link = reader.byte("IsChild")?.is_some_and(|b| b != 0);
    let link_comment = reader.string("LinkComment")?;
    let condition_script = reader.resref("Active")?.unwrap_or_default();
    let (extra_fields, field_order) = reader.finish();
    Ok(Pointer {
        target,
        is_link,
        link_comment,
        condition_script,
        condition_params,
        extra_fields,
        field_order,
    })
}

fn parse_start(position: usize, s: GffStruct) -> Result<StartPointer> {
    let context = format!("start {position}");
    let mut reader = FieldReader::new(context.clone(), s.fields);

    let target = reader.dword("Index")?.ok_or_else(|| reader.missing("Index"))?;
    let condition_params = reader
        .list("ConditionParams")?
        .map(|items| parse_params(&context, "ConditionParams", items))
        .transpose()?;
    let condition_script = reader.resref("Active")?.unwrap_or_default();
    let (extra_fields, field_order) = reader.finish();
    Ok(StartPointer {
        target,
        condition_script,
        condition_params,
        extra_fields,
        field_order,
    })
}

fn parse_params(owner: &str, label: &str, items: Vec<GffStruct>) -> Result<ParameterList> {
    items
        .into_iter()
        .enumerate()
        .map(|(position, s)| -> Result<Parameter> {
            let mut reader = FieldReader::new(format!("{owner} {label} {position}"), s.fields);
            let key = reader.string("Key")?.unwrap_or_default();
            let value = reader.string("Value")?.unwrap_or_default();
            let (extra_fields, field_order) = reader.finish();
            Ok(Parameter {
                key,
                value,
                extra_fields,
                field_order,
            })
        })
        .collect()
}

/// Takes known fields out of a struct by label; whatever is left over is
/// preserved as extra fields.
struct FieldReader {
    context: String,
    order: Vec<String>,
    fields: Vec<Option<GffField>>,
}

impl FieldReader {
    fn new(context: impl Into<String>, fields: Vec<GffField>) -> Self {
        Self {
            context: context.into(),
            order: fields.iter().map(|f| f.label.clone()).collect(),
            fields: fields.into_iter().map(Some).collect(),
        }
    }

    /// Remove the first field with `label`.
    fn take(&mut self, label: &str) -> Option<FieldValue> {
        self.fields
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|f| f.label == label))
            .and_then(Option::take)
            .map(|f| f.value)
    }

    fn typed<T>(
        &mut self,
        label: &str,
        expected: FieldType,
        extract: fn(FieldValue) -> std::result::Result<T, FieldValue>,
    ) -> Result<Option<T>> {
        let Some(value) = self.take(label) else {
            return Ok(None);
        };
        extract(value).map(Some).map_err(|found| Error::FieldTypeMismatch {
            context: self.context.clone(),
            label: label.to_string(),
            expected,
            found: found.field_type(),
        })
    }

    fn byte(&mut self, label: &str) -> Result<Option<u8>> {
        self.typed(label, FieldType::Byte, |v| match v {
            FieldValue::Byte(b) => Ok(b),
            other => Err(other),
        })
    }

    fn dword(&mut self, label: &str) -> Result<Option<u32>> {
        self.typed(label, FieldType::Dword, |v| match v {
            FieldValue::Dword(d) => Ok(d),
            other => Err(other),
        })
    }

    fn string(&mut self, label: &str) -> Result<Option<String>> {
        self.typed(label, FieldType::String, |v| match v {
            FieldValue::String(s) => Ok(s),
            other => Err(other),
        })
    }

    fn resref(&mut self, label: &str) -> Result<Option<ResRef>> {
        self.typed(label, FieldType::ResRef, |v| match v {
            FieldValue::ResRef(r) => Ok(r),
            other => Err(other),
        })
    }

    fn loc_string(&mut self, label: &str) -> Result<Option<LocString>> {
        self.typed(label, FieldType::LocString, |v| match v {
            FieldValue::LocString(s) => Ok(s),
            other => Err(other),
        })
    }

    fn list(&mut self, label: &str) -> Result<Option<Vec<GffStruct>>> {
        self.typed(label, FieldType::List, |v| match v {
            FieldValue::List(items) => Ok(items),
            other => Err(other),
        })
    }

    fn required_list(&mut self, label: &'static str) -> Result<Vec<GffStruct>> {
        self.list(label)?.ok_or_else(|| self.missing(label))
    }

    fn missing(&self, label: &'static str) -> Error {
        Error::MissingField {
            context: self.context.clone(),
            label,
        }
    }

    /// Leftover fields, and the labels of every field the struct held.
    fn finish(self) -> (Vec<GffField>, FieldOrder) {
        let extra = self.fields.into_iter().flatten().collect();
        (extra, FieldOrder::recorded(self.order))
    }
}
