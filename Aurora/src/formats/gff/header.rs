//! GFF header and section descriptors
//!
//! The header is 56 bytes: two 4-byte tags followed by six
//! `(offset, count)` pairs, all little-endian `u32`.

use std::fmt;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::error::{Error, Result};

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 56;

/// Size of a struct record in bytes.
pub const STRUCT_RECORD_SIZE: usize = 12;

/// Size of a field record in bytes.
pub const FIELD_RECORD_SIZE: usize = 12;

/// Size of a label record in bytes.
pub const LABEL_SIZE: usize = 16;

/// The only supported version tag.
pub const GFF_VERSION: [u8; 4] = *b"V3.2";

/// A region of a GFF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Section {
    Header,
    Structs,
    Fields,
    Labels,
    FieldData,
    FieldIndices,
    ListIndices,
}

impl Section {
    /// Size of one record, for sections counted in records rather than bytes.
    #[must_use]
    pub fn record_size(self) -> Option<usize> {
        match self {
            Self::Structs => Some(STRUCT_RECORD_SIZE),
            Self::Fields => Some(FIELD_RECORD_SIZE),
            Self::Labels => Some(LABEL_SIZE),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Structs => "struct",
            Self::Fields => "field",
            Self::Labels => "label",
            Self::FieldData => "field data",
            Self::FieldIndices => "field-index",
            Self::ListIndices => "list-index",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared location of a section: a byte offset and a count.
///
/// The count is in records for structs, fields and labels, and in bytes for
/// the three raw regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionSpan {
    pub offset: u32,
    pub count: u32,
}

impl SectionSpan {
    /// Byte length implied by the span for the given section.
    #[must_use]
    pub fn byte_len(self, section: Section) -> u64 {
        let unit = section.record_size().unwrap_or(1) as u64;
        u64::from(self.count) * unit
    }
}

/// The fixed GFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GffHeader {
    #[serde(serialize_with = "serialize_tag")]
    pub file_type: [u8; 4],
    #[serde(serialize_with = "serialize_tag")]
    pub version: [u8; 4],
    pub structs: SectionSpan,
    pub fields: SectionSpan,
    pub labels: SectionSpan,
    pub field_data: SectionSpan,
    pub field_indices: SectionSpan,
    pub list_indices: SectionSpan,
}

impl GffHeader {
    /// The span declared for a section. The header itself spans `0..56`.
    #[must_use]
    pub fn span(&self, section: Section) -> SectionSpan {
        match section {
            Section::Header => SectionSpan {
                offset: 0,
                count: HEADER_SIZE as u32,
            },
            Section::Structs => self.structs,
            Section::Fields => self.fields,
            Section::Labels => self.labels,
            Section::FieldData => self.field_data,
            Section::FieldIndices => self.field_indices,
            Section::ListIndices => self.list_indices,
        }
    }

    /// The file type tag as text, trailing spaces included.
    #[must_use]
    pub fn file_type_str(&self) -> String {
        String::from_utf8_lossy(&self.file_type).into_owned()
    }

    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.file_type);
        out.extend_from_slice(&self.version);
        for span in [
            self.structs,
            self.fields,
            self.labels,
            self.field_data,
            self.field_indices,
            self.list_indices,
        ] {
            out.write_u32::<LittleEndian>(span.offset)?;
            out.write_u32::<LittleEndian>(span.count)?;
        }
        Ok(())
    }
}

fn serialize_tag<S: serde::Serializer>(
    tag: &[u8; 4],
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(tag))
}

/// Read and validate the fixed header.
///
/// # Errors
/// Returns [`Error::Truncated`] if the buffer is shorter than the header,
/// [`Error::InvalidFileType`] or [`Error::UnsupportedVersion`] for bad tags.
pub fn read_header(data: &[u8]) -> Result<GffHeader> {
    if data.len() < HEADER_SIZE {
        return Err(Error::Truncated {
            section: Section::Header,
            offset: 0,
            needed: HEADER_SIZE as u64,
            available: data.len() as u64,
        });
    }

    let mut file_type = [0u8; 4];
    file_type.copy_from_slice(&data[0..4]);
    if !file_type.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        return Err(Error::InvalidFileType(file_type));
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&data[4..8]);
    if version != GFF_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let mut cursor = Cursor::new(&data[8..HEADER_SIZE]);
    let mut spans = [SectionSpan::default(); 6];
    for span in &mut spans {
        span.offset = cursor.read_u32::<LittleEndian>()?;
        span.count = cursor.read_u32::<LittleEndian>()?;
    }
    let [structs, fields, labels, field_data, field_indices, list_indices] = spans;

    Ok(GffHeader {
        file_type,
        version,
        structs,
        fields,
        labels,
        field_data,
        field_indices,
        list_indices,
    })
}
