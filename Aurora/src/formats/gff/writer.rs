//! GFF file writing and serialization
//!
//! Sections are always emitted in the fixed order the reference tools use:
//! header, structs, fields, labels, field data, field indices, list indices.

use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use tempfile::NamedTempFile;

use super::document::GffFile;
use super::header::HEADER_SIZE;
use crate::error::Result;

/// Write a GFF file to disk.
///
/// The bytes are written to a temporary file next to `path` and renamed
/// into place, so a failure never leaves a partial file behind.
///
/// # Errors
/// Returns an error if serialization or file writing fails.
pub fn write_gff<P: AsRef<Path>>(file: &GffFile, path: P) -> Result<()> {
    let bytes = serialize_gff(file)?;
    write_atomic(path.as_ref(), &bytes)
}

/// Serialize raw GFF tables to bytes.
///
/// Header counts are derived from the tables, so they always match what is
/// physically written.
///
/// # Errors
/// Returns [`crate::Error::SectionTooLarge`] if a section overflows a
/// 32-bit header field.
pub fn serialize_gff(file: &GffFile) -> Result<Vec<u8>> {
    let header = file.layout_header()?;
    let total = header.list_indices.offset as usize + file.list_indices.len();
    let mut output = Vec::with_capacity(total);

    header.write_to(&mut output)?;
    debug_assert_eq!(output.len(), HEADER_SIZE);

    for record in &file.structs {
        output.write_u32::<LittleEndian>(record.type_code)?;
        output.write_u32::<LittleEndian>(record.field_ref)?;
        output.write_u32::<LittleEndian>(record.field_count)?;
    }

    for record in &file.fields {
        output.write_u32::<LittleEndian>(record.field_type.code())?;
        output.write_u32::<LittleEndian>(record.label_index)?;
        output.write_u32::<LittleEndian>(record.data)?;
    }

    for label in &file.labels {
        output.extend_from_slice(&label.to_record());
    }

    output.extend_from_slice(&file.field_data);
    output.extend_from_slice(&file.field_indices);
    output.extend_from_slice(&file.list_indices);

    debug_assert_eq!(output.len(), total);
    Ok(output)
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gff::document::{FieldRecord, Label, ROOT_STRUCT_TYPE, StructRecord};
    use crate::formats::gff::reader::parse_gff_bytes;
    use crate::formats::gff::types::FieldType;

    fn sample() -> GffFile {
        let mut file = GffFile::new(*b"GFF ");
        file.structs.push(StructRecord {
            type_code: ROOT_STRUCT_TYPE,
            field_ref: 0,
            field_count: 2,
        });
        file.fields.push(FieldRecord {
            field_type: FieldType::Dword,
            label_index: 0,
            data: 42,
        });
        file.fields.push(FieldRecord {
            field_type: FieldType::String,
            label_index: 1,
            data: 0,
        });
        file.labels.push(Label::new("Count").unwrap());
        file.labels.push(Label::new("Name").unwrap());
        file.field_data = vec![2, 0, 0, 0, b'o', b'k'];
        file.field_indices = [0u32, 1].iter().flat_map(|i| i.to_le_bytes()).collect();
        file
    }

    #[test]
    fn test_serialize_then_parse() {
        let file = sample();
        let bytes = serialize_gff(&file).unwrap();
        assert_eq!(bytes.len(), 56 + 12 + 24 + 32 + 6 + 8);
        assert_eq!(parse_gff_bytes(&bytes).unwrap(), file);
    }

    #[test]
    fn test_header_counts_match_tables() {
        let bytes = serialize_gff(&sample()).unwrap();
        let header = crate::formats::gff::read_header(&bytes).unwrap();
        assert_eq!(header.structs.count, 1);
        assert_eq!(header.fields.count, 2);
        assert_eq!(header.labels.count, 2);
        assert_eq!(header.field_data.count, 6);
        assert_eq!(header.field_indices.count, 8);
        assert_eq!(header.list_indices.count, 0);
        assert_eq!(header.list_indices.offset as usize, bytes.len());
    }

    #[test]
    fn test_write_gff_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.gff");
        write_gff(&sample(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, serialize_gff(&sample()).unwrap());
    }
}
