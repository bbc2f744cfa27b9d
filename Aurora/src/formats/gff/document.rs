//! Raw GFF section records
//!
//! These types mirror the on-disk tables one-to-one. Nothing here knows what
//! the structs mean; see [`super::tree`] for the resolved view.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use super::header::{
    FIELD_RECORD_SIZE, GFF_VERSION, GffHeader, HEADER_SIZE, LABEL_SIZE, STRUCT_RECORD_SIZE, Section,
    SectionSpan,
};
use super::types::FieldType;
use crate::error::{Error, Result};

/// Type code reserved for the root struct.
pub const ROOT_STRUCT_TYPE: u32 = 0xFFFF_FFFF;

/// Field-ref stored by structs with no fields.
pub const EMPTY_FIELD_REF: u32 = 0xFFFF_FFFF;

/// A struct record.
///
/// With one field, `field_ref` is that field's index. With more, it is a
/// byte offset into the field-index table where `field_count` consecutive
/// `u32` field indices live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructRecord {
    pub type_code: u32,
    pub field_ref: u32,
    pub field_count: u32,
}

/// A field record.
///
/// `data` holds the value for inline types, a struct index for struct
/// fields, and a byte offset into the field data or list-index table
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRecord {
    pub field_type: FieldType,
    pub label_index: u32,
    pub data: u32,
}

/// A 16-byte, null-padded field label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    /// Create a label, rejecting non-ASCII text and text over 16 bytes.
    pub fn new(text: &str) -> Result<Self> {
        if text.len() > LABEL_SIZE || !text.is_ascii() || text.contains('\0') {
            return Err(Error::InvalidLabel {
                label: text.to_string(),
            });
        }
        Ok(Self(text.to_string()))
    }

    /// Decode a label record, stopping at the first null byte.
    #[must_use]
    pub fn from_record(bytes: &[u8; LABEL_SIZE]) -> Self {
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(LABEL_SIZE);
        Self(String::from_utf8_lossy(&bytes[..len]).into_owned())
    }

    #[must_use]
    pub fn to_record(&self) -> [u8; LABEL_SIZE] {
        let mut record = [0u8; LABEL_SIZE];
        record[..self.0.len()].copy_from_slice(self.0.as_bytes());
        record
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A whole GFF file as its raw section tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GffFile {
    pub file_type: [u8; 4],
    pub structs: Vec<StructRecord>,
    pub fields: Vec<FieldRecord>,
    pub labels: Vec<Label>,
    pub field_data: Vec<u8>,
    pub field_indices: Vec<u8>,
    pub list_indices: Vec<u8>,
}

impl GffFile {
    #[must_use]
    pub fn new(file_type: [u8; 4]) -> Self {
        Self {
            file_type,
            structs: Vec::new(),
            fields: Vec::new(),
            labels: Vec::new(),
            field_data: Vec::new(),
            field_indices: Vec::new(),
            list_indices: Vec::new(),
        }
    }

    /// The header that describes these tables when written in the fixed
    /// section order: structs, fields, labels, field data, field indices,
    /// list indices.
    pub fn layout_header(&self) -> Result<GffHeader> {
        let lengths = [
            (Section::Structs, self.structs.len() * STRUCT_RECORD_SIZE, self.structs.len()),
            (Section::Fields, self.fields.len() * FIELD_RECORD_SIZE, self.fields.len()),
            (Section::Labels, self.labels.len() * LABEL_SIZE, self.labels.len()),
            (Section::FieldData, self.field_data.len(), self.field_data.len()),
            (Section::FieldIndices, self.field_indices.len(), self.field_indices.len()),
            (Section::ListIndices, self.list_indices.len(), self.list_indices.len()),
        ];

        let mut spans = [SectionSpan::default(); 6];
        let mut offset = HEADER_SIZE;
        for (span, (section, byte_len, count)) in spans.iter_mut().zip(lengths) {
            let too_large = || Error::SectionTooLarge {
                section,
                length: byte_len,
            };
            span.offset = u32::try_from(offset).map_err(|_| too_large())?;
            span.count = u32::try_from(count).map_err(|_| too_large())?;
            offset = offset.checked_add(byte_len).ok_or_else(too_large)?;
        }
        u32::try_from(offset).map_err(|_| Error::SectionTooLarge {
            section: Section::ListIndices,
            length: offset,
        })?;
        let [structs, fields, labels, field_data, field_indices, list_indices] = spans;

        Ok(GffHeader {
            file_type: self.file_type,
            version: GFF_VERSION,
            structs,
            fields,
            labels,
            field_data,
            field_indices,
            list_indices,
        })
    }

    /// Field indices of a struct, following the one-field/many-field rule.
    pub fn struct_field_indices(&self, struct_index: usize) -> Result<Vec<u32>> {
        let record = *self.structs.get(struct_index).ok_or(Error::RecordOutOfRange {
            section: Section::Structs,
            index: struct_index,
            count: self.structs.len(),
        })?;
        let indices = match record.field_count {
            0 => Vec::new(),
            1 => vec![record.field_ref],
            count => {
                let start = record.field_ref as usize;
                let end = (count as usize)
                    .checked_mul(4)
                    .and_then(|len| start.checked_add(len));
                let Some(bytes) = end.and_then(|end| self.field_indices.get(start..end)) else {
                    return Err(Error::FieldIndicesOutOfBounds {
                        struct_index,
                        offset: record.field_ref,
                        count,
                        table_len: self.field_indices.len(),
                    });
                };
                bytes.chunks_exact(4).map(LittleEndian::read_u32).collect()
            }
        };

        for &field_index in &indices {
            if field_index as usize >= self.fields.len() {
                return Err(Error::FieldIndexOutOfRange {
                    struct_index,
                    field_index,
                    field_count: self.fields.len(),
                });
            }
        }
        Ok(indices)
    }

    /// Struct indices held by a list field whose data is `offset`.
    pub fn list_struct_indices(&self, field_index: usize, offset: u32) -> Result<Vec<u32>> {
        let out_of_bounds = || Error::ValueOutOfBounds {
            section: Section::ListIndices,
            field_index,
            offset: u64::from(offset),
            section_len: self.list_indices.len(),
        };

        let start = offset as usize;
        let body = start.checked_add(4).ok_or_else(out_of_bounds)?;
        let count_bytes = self.list_indices.get(start..body).ok_or_else(out_of_bounds)?;
        let count = LittleEndian::read_u32(count_bytes) as usize;
        let end = count
            .checked_mul(4)
            .and_then(|len| body.checked_add(len))
            .ok_or_else(out_of_bounds)?;
        let bytes = self.list_indices.get(body..end).ok_or_else(out_of_bounds)?;

        let indices: Vec<u32> = bytes.chunks_exact(4).map(LittleEndian::read_u32).collect();
        for &struct_index in &indices {
            self.check_struct_index(field_index, struct_index)?;
        }
        Ok(indices)
    }

    /// Label text of a field.
    pub fn field_label(&self, field_index: usize) -> Result<&Label> {
        let label_index = self
            .fields
            .get(field_index)
            .ok_or(Error::RecordOutOfRange {
                section: Section::Fields,
                index: field_index,
                count: self.fields.len(),
            })?
            .label_index;
        self.labels
            .get(label_index as usize)
            .ok_or(Error::LabelIndexOutOfRange {
                field_index,
                label_index,
                label_count: self.labels.len(),
            })
    }

    pub(crate) fn check_struct_index(&self, field_index: usize, struct_index: u32) -> Result<()> {
        if struct_index as usize >= self.structs.len() {
            return Err(Error::StructIndexOutOfRange {
                field_index,
                struct_index,
                struct_count: self.structs.len(),
            });
        }
        Ok(())
    }
}
