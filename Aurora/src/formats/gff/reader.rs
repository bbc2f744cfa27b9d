//! GFF file reading and parsing
//!
//! Every section is read from its declared offset for exactly its declared
//! count. Adjacent section boundaries are never used to infer anything.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::document::{FieldRecord, GffFile, Label, StructRecord};
use super::header::{GffHeader, LABEL_SIZE, Section, read_header};
use super::types::FieldType;
use crate::error::{Error, Result};

/// Read a GFF file from disk
///
/// # Errors
/// Returns an error if the file cannot be read or has an invalid format.
pub fn read_gff<P: AsRef<Path>>(path: P) -> Result<GffFile> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    parse_gff_bytes(&buffer)
}

/// Parse GFF data from bytes into its raw section tables
///
/// # Errors
/// Returns a structural error naming the section if the header is truncated,
/// a tag is invalid, or any section reaches past the end of the buffer.
pub fn parse_gff_bytes(data: &[u8]) -> Result<GffFile> {
    let header = read_header(data)?;

    tracing::debug!(
        "GFF {}: {} structs, {} fields, {} labels, {} data bytes, {} field-index bytes, {} list-index bytes",
        header.file_type_str(),
        header.structs.count,
        header.fields.count,
        header.labels.count,
        header.field_data.count,
        header.field_indices.count,
        header.list_indices.count,
    );

    for section in [Section::FieldIndices, Section::ListIndices] {
        let length = header.span(section).count;
        if length % 4 != 0 {
            return Err(Error::MisalignedSection { section, length });
        }
    }

    let structs = read_structs(section_bytes(data, &header, Section::Structs)?)?;
    let fields = read_fields(
        section_bytes(data, &header, Section::Fields)?,
        u64::from(header.fields.offset),
    )?;
    let labels = read_labels(section_bytes(data, &header, Section::Labels)?);
    let field_data = section_bytes(data, &header, Section::FieldData)?.to_vec();
    let field_indices = section_bytes(data, &header, Section::FieldIndices)?.to_vec();
    let list_indices = section_bytes(data, &header, Section::ListIndices)?.to_vec();

    Ok(GffFile {
        file_type: header.file_type,
        structs,
        fields,
        labels,
        field_data,
        field_indices,
        list_indices,
    })
}

/// Slice out a section exactly as the header declares it.
fn section_bytes<'a>(data: &'a [u8], header: &GffHeader, section: Section) -> Result<&'a [u8]> {
    let span = header.span(section);
    let offset = u64::from(span.offset);
    let length = span.byte_len(section);

    let out_of_bounds = || Error::SectionOutOfBounds {
        section,
        offset,
        length,
        buffer_len: data.len(),
    };
    let end = offset.checked_add(length).ok_or_else(out_of_bounds)?;
    if end > data.len() as u64 {
        return Err(out_of_bounds());
    }
    Ok(&data[offset as usize..end as usize])
}

fn read_structs(bytes: &[u8]) -> Result<Vec<StructRecord>> {
    let mut cursor = Cursor::new(bytes);
    let count = bytes.len() / 12;
    let mut structs = Vec::with_capacity(count);
    for _ in 0..count {
        structs.push(StructRecord {
            type_code: cursor.read_u32::<LittleEndian>()?,
            field_ref: cursor.read_u32::<LittleEndian>()?,
            field_count: cursor.read_u32::<LittleEndian>()?,
        });
    }
    Ok(structs)
}

fn read_fields(bytes: &[u8], section_offset: u64) -> Result<Vec<FieldRecord>> {
    let mut cursor = Cursor::new(bytes);
    let count = bytes.len() / 12;
    let mut fields = Vec::with_capacity(count);
    for field_index in 0..count {
        let type_code = cursor.read_u32::<LittleEndian>()?;
        let field_type = FieldType::from_code(type_code).ok_or(Error::UnknownFieldType {
            type_code,
            field_index,
            offset: section_offset + field_index as u64 * 12,
        })?;
        fields.push(FieldRecord {
            field_type,
            label_index: cursor.read_u32::<LittleEndian>()?,
            data: cursor.read_u32::<LittleEndian>()?,
        });
    }
    Ok(fields)
}

fn read_labels(bytes: &[u8]) -> Vec<Label> {
    bytes
        .chunks_exact(LABEL_SIZE)
        .map(|chunk| {
            let mut record = [0u8; LABEL_SIZE];
            record.copy_from_slice(chunk);
            Label::from_record(&record)
        })
        .collect()
}
