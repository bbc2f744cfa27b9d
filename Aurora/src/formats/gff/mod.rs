//! GFF (Generic File Format) container codec
//!
//! A GFF file is a typed struct/field/label archive. The same container
//! carries conversations, creatures, items and more; this module knows only
//! the container. Decoding goes bytes → [`GffFile`] (raw tables) →
//! [`GffStruct`] (resolved tree). Encoding a tree goes through
//! [`crate::compat`], which decides the physical layout.

mod document;
mod header;
mod label_table;
mod reader;
mod tree;
mod types;
mod value;
mod writer;

// Public API
pub use document::{EMPTY_FIELD_REF, FieldRecord, GffFile, Label, ROOT_STRUCT_TYPE, StructRecord};
pub use header::{
    FIELD_RECORD_SIZE, GFF_VERSION, GffHeader, HEADER_SIZE, LABEL_SIZE, STRUCT_RECORD_SIZE, Section,
    SectionSpan, read_header,
};
pub use label_table::LabelTable;
pub use reader::{parse_gff_bytes, read_gff};
pub use tree::{GffField, GffStruct, MAX_SHARED_EXPANSION, ResolvedTree};
pub use types::{
    FieldType, FieldValue, LocString, LocalizedText, RESREF_MAX_LEN, ResRef, STRREF_NONE,
};
pub use value::{decode_blob, decode_inline, encode_blob, encode_inline};
pub use writer::{serialize_gff, write_gff};

pub(crate) use writer::write_atomic;

/// Decode bytes into a struct tree.
///
/// # Errors
/// Returns a structural error if the bytes are not a well-formed container.
pub fn decode_gff(data: &[u8]) -> crate::Result<GffStruct> {
    parse_gff_bytes(data)?.to_tree()
}
