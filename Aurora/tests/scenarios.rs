//! End-to-end conversation scenarios.

use aurora::compat::{
    CompatWarning, LayoutProfile, ReferencePolicy, StructOrdering, TypeCodeRule, encode_gff,
};
use aurora::dialog::{
    self, DLG_FILE_TYPE, Dialog, DialogNode, NodeRef, Pointer, StartPointer, TerminalReason,
    export,
};
use aurora::formats::gff::{
    FieldValue, GffFile, GffStruct, LocString, ResRef, Section, parse_gff_bytes, serialize_gff,
};
use aurora::{Error, ErrorKind};
use pretty_assertions::assert_eq;

fn hello_hi() -> Dialog {
    let mut dialog = Dialog::new();
    dialog
        .entries
        .push(DialogNode::with_text("Hello").pointing_to(Pointer::to(0)));
    dialog.replies.push(DialogNode::with_text("Hi"));
    dialog.starts.push(StartPointer::new(0));
    dialog
}

fn text(line: &str) -> FieldValue {
    FieldValue::LocString(LocString::english(line))
}

fn pointer_list(targets: &[u32], pointer: fn(u32) -> GffStruct) -> FieldValue {
    FieldValue::List(targets.iter().map(|&t| pointer(t)).collect())
}

fn foreign_pointer(index: u32) -> GffStruct {
    GffStruct::new(0)
        .with("IsChild", FieldValue::Byte(0))
        .with("Index", FieldValue::Dword(index))
}

fn foreign_entry(line: &str, targets: &[u32]) -> GffStruct {
    GffStruct::new(0)
        .with("Animation", FieldValue::Dword(28))
        .with("AnimLoop", FieldValue::Byte(1))
        .with("Text", text(line))
        .with("RepliesList", pointer_list(targets, foreign_pointer))
}

fn foreign_reply(line: &str, targets: &[u32]) -> GffStruct {
    GffStruct::new(0)
        .with("EntriesList", pointer_list(targets, foreign_pointer))
        .with("Text", text(line))
}

/// A guard conversation laid out the way another writer might: fields in
/// an unusual order, and each struct holding only what it needs.
fn foreign_tree() -> GffStruct {
    let start = GffStruct::new(0)
        .with("Active", FieldValue::ResRef(ResRef::new("gc_day").unwrap()))
        .with("Index", FieldValue::Dword(0));
    GffStruct::root()
        .with("NumWords", FieldValue::Dword(5))
        .with("StartingList", FieldValue::List(vec![start]))
        .with(
            "EntryList",
            FieldValue::List(vec![
                foreign_entry("Halt!", &[0, 1]),
                foreign_entry("Move along.", &[]),
            ]),
        )
        .with(
            "ReplyList",
            FieldValue::List(vec![
                foreign_reply("Why?", &[1]),
                foreign_reply("Sorry.", &[]),
            ]),
        )
        .with("DelayEntry", FieldValue::Dword(0))
}

/// Entries and replies with nothing but their text and pointer list, and
/// pointers with nothing but their target.
fn sparse_tree() -> GffStruct {
    fn index_only(index: u32) -> GffStruct {
        GffStruct::new(0).with("Index", FieldValue::Dword(index))
    }
    let node = |line: &str, list: &str, targets: &[u32]| {
        GffStruct::new(0)
            .with("Text", text(line))
            .with(list, pointer_list(targets, index_only))
    };
    GffStruct::root()
        .with(
            "EntryList",
            FieldValue::List(vec![
                node("Hello", "RepliesList", &[0]),
                node("Bye", "RepliesList", &[]),
            ]),
        )
        .with(
            "ReplyList",
            FieldValue::List(vec![node("Hi", "EntriesList", &[1])]),
        )
        .with("StartingList", FieldValue::List(vec![index_only(0)]))
}

/// Decode, learn the layout, and encode again without edits.
fn reencode(bytes: &[u8]) -> Vec<u8> {
    let (decoded, profile) = dialog::decode_with_layout(bytes).unwrap();
    let (learned, _) = ReferencePolicy::from_profile(&profile);
    dialog::encode_with(&decoded, &learned).unwrap().bytes
}

fn counts(file: &GffFile) -> (usize, usize, usize) {
    (file.structs.len(), file.fields.len(), file.labels.len())
}

#[test]
fn hello_hi_round_trips() {
    let bytes = dialog::encode(&hello_hi()).unwrap();
    let decoded = dialog::decode(&bytes).unwrap();
    assert_eq!(decoded.entries.len(), 1);
    assert_eq!(decoded.replies.len(), 1);
    assert_eq!(decoded.starts.len(), 1);
    assert_eq!(decoded.entries[0].display_text(), "Hello");
    assert_eq!(decoded.replies[0].display_text(), "Hi");

    let again = dialog::encode(&decoded).unwrap();
    assert_eq!(again.len(), bytes.len());
    assert_eq!(
        aurora::formats::gff::decode_gff(&again).unwrap(),
        aurora::formats::gff::decode_gff(&bytes).unwrap()
    );
}

#[test]
fn reply_linking_back_to_first_entry_is_terminal() {
    let mut dialog = hello_hi();
    dialog.replies[0].pointers.push(Pointer::link(0));
    let dialog = dialog::decode(&dialog::encode(&dialog).unwrap()).unwrap();

    let steps: Vec<_> = dialog.traverse(0).collect();
    assert_eq!(steps.len(), 3);
    let last = &steps[2];
    assert_eq!(last.target, NodeRef::entry(0));
    assert_eq!(last.edge.owner(), Some(NodeRef::reply(0)));
    assert_eq!(last.terminal, Some(TerminalReason::Link));
    assert!(last.edge.is_link());
}

#[test]
fn corrupted_label_count_is_structural() {
    let mut bytes = dialog::encode(&hello_hi()).unwrap();
    bytes[0x1C..0x20].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());

    let err = dialog::decode(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert!(matches!(
        err,
        Error::SectionOutOfBounds {
            section: Section::Labels,
            ..
        }
    ));
}

#[test]
fn truncated_buffer_is_structural() {
    let bytes = dialog::encode(&hello_hi()).unwrap();
    for len in [0, 10, 55, bytes.len() - 1] {
        let err = dialog::decode(&bytes[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural, "length {len}");
    }
}

#[test]
fn dangling_pointer_is_semantic() {
    let mut dialog = hello_hi();
    dialog.entries[0].pointers.push(Pointer::to(4));
    let err = dialog::encode(&dialog).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Semantic);
    assert!(matches!(
        err,
        Error::DanglingPointer { owner, pointer: 1, target: 4, .. } if owner == NodeRef::entry(0)
    ));
}

/// Files written by other tools come back byte-for-byte when re-encoded
/// under the layout detected from them.
#[test]
fn detected_layout_reproduces_source_bytes() {
    let mut dialog = hello_hi();
    dialog.entries.push(DialogNode::with_text("Farewell"));
    dialog.replies[0].pointers.push(Pointer::to(1));
    dialog.replies.push(DialogNode::with_text("Hi"));
    dialog.entries[0].pointers.push(Pointer::to(1));

    for ordering in StructOrdering::ALL {
        for rule in [TypeCodeRule::ShapeFrequency, TypeCodeRule::ListPosition] {
            for dedup in [false, true] {
                let source = ReferencePolicy::provisional()
                    .with_ordering(ordering)
                    .with_type_codes(rule)
                    .with_dedup(dedup);
                let bytes = dialog::encode_with(&dialog, &source).unwrap().bytes;

                let (decoded, profile) = dialog::decode_with_layout(&bytes).unwrap();
                let (learned, warnings) = ReferencePolicy::from_profile(&profile);
                assert!(warnings.is_empty(), "{ordering} {rule} dedup={dedup}: {warnings:?}");
                let report = dialog::encode_with(&decoded, &learned).unwrap();
                assert_eq!(report.bytes, bytes, "{ordering} {rule} dedup={dedup}");
            }
        }
    }
}

#[test]
fn foreign_field_order_reproduces_source_bytes() {
    for ordering in StructOrdering::ALL {
        let source = ReferencePolicy::provisional().with_ordering(ordering);
        let bytes = encode_gff(&foreign_tree(), DLG_FILE_TYPE, &source)
            .unwrap()
            .bytes;
        assert_eq!(reencode(&bytes), bytes, "{ordering}");
    }
}

#[test]
fn sparse_source_keeps_its_fields() {
    let bytes = encode_gff(&sparse_tree(), DLG_FILE_TYPE, &ReferencePolicy::provisional())
        .unwrap()
        .bytes;
    let again = reencode(&bytes);

    let before = parse_gff_bytes(&bytes).unwrap();
    let after = parse_gff_bytes(&again).unwrap();
    assert_eq!(counts(&after), counts(&before));
    assert_eq!(counts(&before), (7, 12, 7));
    assert_eq!(again, bytes);
}

#[test]
fn sparse_source_edit_adds_only_the_edited_field() {
    let bytes = encode_gff(&sparse_tree(), DLG_FILE_TYPE, &ReferencePolicy::provisional())
        .unwrap()
        .bytes;
    let (mut dialog, profile) = dialog::decode_with_layout(&bytes).unwrap();
    let (learned, _) = ReferencePolicy::from_profile(&profile);
    dialog.replies[0].comment = "pause here".to_string();

    let edited = dialog::encode_with(&dialog, &learned).unwrap().bytes;
    let before = parse_gff_bytes(&bytes).unwrap();
    let after = parse_gff_bytes(&edited).unwrap();
    assert_eq!(after.structs.len(), before.structs.len());
    assert_eq!(after.fields.len(), before.fields.len() + 1);
    assert_eq!(after.labels.len(), before.labels.len() + 1);
    assert_eq!(dialog::decode(&edited).unwrap(), dialog);
}

#[test]
fn labels_out_of_first_use_order_are_reproduced() {
    let source = ReferencePolicy::provisional().with_ordering(StructOrdering::DepthFirst);
    let bytes = encode_gff(&foreign_tree(), DLG_FILE_TYPE, &source)
        .unwrap()
        .bytes;
    let mut file = parse_gff_bytes(&bytes).unwrap();
    let last = file.labels.len() as u32 - 1;
    file.labels.reverse();
    for field in &mut file.fields {
        field.label_index = last - field.label_index;
    }
    let relabeled = serialize_gff(&file).unwrap();
    assert_ne!(relabeled, bytes);

    assert_eq!(reencode(&relabeled), relabeled);
}

#[test]
fn shared_value_offsets_are_reproduced() {
    let mut root = foreign_tree();
    let repeats = [
        foreign_reply("Sorry.", &[]),
        foreign_reply("Sorry.", &[1]),
    ];
    let replies = root
        .fields
        .iter_mut()
        .find(|f| f.label == "ReplyList")
        .map(|f| &mut f.value);
    if let Some(FieldValue::List(replies)) = replies {
        replies.extend(repeats);
    }
    let source = ReferencePolicy::provisional().with_dedup(true);
    let bytes = encode_gff(&root, DLG_FILE_TYPE, &source).unwrap().bytes;

    let (_, profile) = dialog::decode_with_layout(&bytes).unwrap();
    assert!(profile.shared_values);
    assert_eq!(reencode(&bytes), bytes);
}

#[test]
fn edit_with_novel_shape_warns_but_writes() {
    let bytes = dialog::encode(&hello_hi()).unwrap();
    let (mut dialog, profile) = dialog::decode_with_layout(&bytes).unwrap();
    let (policy, _) = ReferencePolicy::from_profile(&profile);

    dialog.entries[0].quest_entry = Some(3);
    let report = dialog::encode_with(&dialog, &policy).unwrap();
    assert!(
        report
            .warnings
            .iter()
            .any(|w| matches!(w, CompatWarning::NovelShape { .. }))
    );
    assert_eq!(dialog::decode(&report.bytes).unwrap(), dialog);
}

#[test]
fn generic_container_detects_layout() {
    let root = GffStruct::root().with(
        "List",
        FieldValue::List(vec![GffStruct::new(0), GffStruct::new(0)]),
    );
    let policy = ReferencePolicy::provisional().with_type_codes(TypeCodeRule::ListPosition);
    let report = encode_gff(&root, *b"GFF ", &policy).unwrap();
    let profile = LayoutProfile::detect(&parse_gff_bytes(&report.bytes).unwrap()).unwrap();
    assert_eq!(profile.type_codes, Some(TypeCodeRule::ListPosition));
}

#[test]
fn outline_and_structure_of_looping_dialog() {
    let mut dialog = hello_hi();
    dialog.replies[0].pointers.push(Pointer::link(0));

    let outline = export::render_tree(&dialog);
    assert_eq!(
        outline,
        "[start 0] entry 0: \"Hello\"\n  reply 0: \"Hi\"\n    -> entry 0 (link): \"Hello\"\n"
    );

    let structure = export::structure(&dialog);
    assert_eq!(structure.nodes.len(), 4);
    assert_eq!(structure.links.len(), 3);
    assert_eq!(structure.links[2].target, "link_1");
}

#[test]
fn write_then_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello.dlg");
    let policy = ReferencePolicy::provisional();
    let report = dialog::write_dialog_with(&path, &hello_hi(), &policy).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), report.bytes);
    assert_eq!(dialog::read_dialog(&path).unwrap(), hello_hi());
}
