//! Error types for `Aurora`

use thiserror::Error;

use crate::dialog::NodeRef;
use crate::formats::gff::{FieldType, Section};

/// Broad classification of an [`Error`].
///
/// Structural errors mean the bytes are not a well-formed container.
/// Semantic errors mean the container is well-formed but does not describe
/// a valid document of the expected kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Structural,
    Semantic,
    Encode,
}

/// The error type for `Aurora` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Structural Decode Errors ====================
    /// The buffer ends before a fixed-size record could be read.
    #[error("truncated {section}: need {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        /// Section being read.
        section: Section,
        /// Absolute byte offset of the read.
        offset: u64,
        /// Bytes required.
        needed: u64,
        /// Bytes left in the buffer.
        available: u64,
    },

    /// The file type tag is not four printable ASCII characters.
    #[error("invalid file type tag: {0:?}")]
    InvalidFileType([u8; 4]),

    /// The file type tag is valid but not the one the caller asked for.
    #[error("unexpected file type: expected {expected:?}, found {found:?}")]
    UnexpectedFileType {
        /// The tag the caller expected.
        expected: String,
        /// The tag found in the header.
        found: String,
    },

    /// The version tag is not `V3.2`.
    #[error("unsupported GFF version: {0:?}")]
    UnsupportedVersion([u8; 4]),

    /// A section's declared offset and size reach past the end of the buffer.
    #[error("{section} section out of bounds: offset {offset} + {length} bytes exceeds buffer of {buffer_len} bytes")]
    SectionOutOfBounds {
        /// The offending section.
        section: Section,
        /// Declared offset.
        offset: u64,
        /// Declared size in bytes.
        length: u64,
        /// Total buffer size.
        buffer_len: usize,
    },

    /// An index table's byte length is not a whole number of 4-byte entries.
    #[error("{section} section length {length} is not a multiple of 4")]
    MisalignedSection {
        /// The offending section.
        section: Section,
        /// Declared byte length.
        length: u32,
    },

    /// A field record carries a type code outside the known set.
    #[error("unknown field type {type_code} at field {field_index} (byte offset {offset})")]
    UnknownFieldType {
        /// The raw type code.
        type_code: u32,
        /// Index of the field record.
        field_index: usize,
        /// Absolute byte offset of the field record.
        offset: u64,
    },

    /// A field's value offset runs past the end of the section holding it.
    #[error("field {field_index}: value at {section} offset {offset} runs past end of section ({section_len} bytes)")]
    ValueOutOfBounds {
        /// Section the value lives in.
        section: Section,
        /// Index of the field record.
        field_index: usize,
        /// Section-relative offset of the value.
        offset: u64,
        /// Size of the section.
        section_len: usize,
    },

    /// A multi-field struct's field-ref runs past the end of the field-index table.
    #[error("struct {struct_index}: {count} field indices at offset {offset} run past end of field-index table ({table_len} bytes)")]
    FieldIndicesOutOfBounds {
        /// Index of the struct record.
        struct_index: usize,
        /// Byte offset into the field-index table.
        offset: u32,
        /// Declared field count.
        count: u32,
        /// Size of the field-index table.
        table_len: usize,
    },

    /// A resource reference longer than 16 bytes.
    #[error("field {field_index}: resource reference length {length} exceeds 16 bytes")]
    InvalidResRef {
        /// Index of the field record.
        field_index: usize,
        /// Declared length.
        length: usize,
    },

    /// A struct references a field index beyond the field table.
    #[error("struct {struct_index} references field {field_index}, but only {field_count} fields exist")]
    FieldIndexOutOfRange {
        /// Index of the referencing struct.
        struct_index: usize,
        /// The referenced field index.
        field_index: u32,
        /// Number of field records.
        field_count: usize,
    },

    /// A field references a label index beyond the label table.
    #[error("field {field_index} references label {label_index}, but only {label_count} labels exist")]
    LabelIndexOutOfRange {
        /// Index of the referencing field.
        field_index: usize,
        /// The referenced label index.
        label_index: u32,
        /// Number of labels.
        label_count: usize,
    },

    /// A struct or list field references a struct index beyond the struct table.
    #[error("field {field_index} references struct {struct_index}, but only {struct_count} structs exist")]
    StructIndexOutOfRange {
        /// Index of the referencing field.
        field_index: usize,
        /// The referenced struct index.
        struct_index: u32,
        /// Number of struct records.
        struct_count: usize,
    },

    /// A struct is reachable from its own fields.
    #[error("struct {struct_index} is reachable from itself")]
    StructCycle {
        /// Index of the struct that closes the cycle.
        struct_index: u32,
    },

    /// The struct table is empty.
    #[error("container has no root struct")]
    MissingRootStruct,

    /// A direct lookup names a record past the end of its table.
    #[error("{section} record {index} does not exist; the table holds {count}")]
    RecordOutOfRange {
        /// Table looked up.
        section: Section,
        /// Requested record index.
        index: usize,
        /// Number of records in the table.
        count: usize,
    },

    /// A value codec call named a type that does not live in the field data blob.
    #[error("{field_type} values are not stored in the field data blob")]
    NotBlobType {
        /// The inline, struct or list type passed in.
        field_type: FieldType,
    },

    /// Shared structs expand the resolved tree past its size limit.
    #[error("resolved tree exceeds {limit} structs; shared structs nest too deeply")]
    ExpansionLimit {
        /// Largest number of structs a tree may resolve to.
        limit: usize,
    },

    // ==================== Semantic Validation Errors ====================
    /// The root struct does not carry the reserved root type code.
    #[error("root struct has type code {found:#x}, expected {expected:#x}")]
    InvalidRootType {
        /// Type code found on struct 0.
        found: u32,
        /// The reserved root type code.
        expected: u32,
    },

    /// A required field is absent from a mapped struct.
    #[error("{context}: missing required field {label}")]
    MissingField {
        /// The struct being mapped, e.g. "entry 3 pointer 1".
        context: String,
        /// The missing label.
        label: &'static str,
    },

    /// A field has a different wire type than the mapping expects.
    #[error("{context}: field {label} is {found}, expected {expected}")]
    FieldTypeMismatch {
        /// The struct being mapped.
        context: String,
        /// The field label.
        label: String,
        /// The expected wire type.
        expected: FieldType,
        /// The wire type found.
        found: FieldType,
    },

    /// A node pointer targets an index outside the target collection.
    #[error("{owner} pointer {pointer} targets index {target}, but only {available} exist")]
    DanglingPointer {
        /// The node owning the pointer.
        owner: NodeRef,
        /// Position of the pointer in the owner's pointer list.
        pointer: usize,
        /// The out-of-range target index.
        target: u32,
        /// Size of the target collection.
        available: usize,
    },

    /// A start pointer targets an entry index outside the entry collection.
    #[error("start {start} targets entry {target}, but only {available} entries exist")]
    DanglingStart {
        /// Position of the start pointer.
        start: usize,
        /// The out-of-range entry index.
        target: u32,
        /// Number of entries.
        available: usize,
    },

    // ==================== Encode Errors ====================
    /// A field label does not fit the 16-byte label record or is not ASCII.
    #[error("invalid label {label:?}: labels are at most 16 ASCII bytes")]
    InvalidLabel {
        /// The offending label.
        label: String,
    },

    /// A resource reference does not fit in 16 bytes.
    #[error("resource reference {value:?} exceeds 16 bytes")]
    ResRefTooLong {
        /// The offending value.
        value: String,
    },

    /// Text contains characters outside the Windows-1252 code page.
    #[error("text cannot be encoded as Windows-1252: {text:?}")]
    UnmappableText {
        /// The offending text.
        text: String,
    },

    /// A section grew past what a 32-bit header field can describe.
    #[error("{section} section too large: {length} bytes")]
    SectionTooLarge {
        /// The offending section.
        section: Section,
        /// Size that overflowed.
        length: usize,
    },

    /// A compatibility policy returned a struct order that is not a permutation.
    #[error("invalid struct order from policy {policy}: {reason}")]
    InvalidStructOrder {
        /// Name of the policy.
        policy: String,
        /// What was wrong with the order.
        reason: String,
    },
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Truncated { .. }
            | Self::InvalidFileType(_)
            | Self::UnexpectedFileType { .. }
            | Self::UnsupportedVersion(_)
            | Self::SectionOutOfBounds { .. }
            | Self::MisalignedSection { .. }
            | Self::UnknownFieldType { .. }
            | Self::ValueOutOfBounds { .. }
            | Self::FieldIndicesOutOfBounds { .. }
            | Self::InvalidResRef { .. }
            | Self::FieldIndexOutOfRange { .. }
            | Self::LabelIndexOutOfRange { .. }
            | Self::StructIndexOutOfRange { .. }
            | Self::StructCycle { .. }
            | Self::MissingRootStruct
            | Self::RecordOutOfRange { .. }
            | Self::NotBlobType { .. }
            | Self::ExpansionLimit { .. } => ErrorKind::Structural,
            Self::InvalidRootType { .. }
            | Self::MissingField { .. }
            | Self::FieldTypeMismatch { .. }
            | Self::DanglingPointer { .. }
            | Self::DanglingStart { .. } => ErrorKind::Semantic,
            Self::InvalidLabel { .. }
            | Self::ResRefTooLong { .. }
            | Self::UnmappableText { .. }
            | Self::SectionTooLarge { .. }
            | Self::InvalidStructOrder { .. } => ErrorKind::Encode,
        }
    }

    /// The container section this error refers to, if any.
    #[must_use]
    pub fn section(&self) -> Option<Section> {
        match self {
            Self::Truncated { section, .. }
            | Self::SectionOutOfBounds { section, .. }
            | Self::MisalignedSection { section, .. }
            | Self::ValueOutOfBounds { section, .. }
            | Self::RecordOutOfRange { section, .. }
            | Self::SectionTooLarge { section, .. } => Some(*section),
            Self::InvalidFileType(_)
            | Self::UnexpectedFileType { .. }
            | Self::UnsupportedVersion(_) => Some(Section::Header),
            Self::UnknownFieldType { .. } | Self::LabelIndexOutOfRange { .. } => {
                Some(Section::Fields)
            }
            Self::FieldIndicesOutOfBounds { .. } => Some(Section::FieldIndices),
            Self::StructCycle { .. } | Self::ExpansionLimit { .. } => Some(Section::Structs),
            _ => None,
        }
    }
}

/// A specialized Result type for `Aurora` operations.
pub type Result<T> = std::result::Result<T, Error>;
