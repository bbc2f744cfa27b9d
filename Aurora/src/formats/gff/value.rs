//! Value codec: field values to and from the data slot and field data blob
//!
//! Values of four bytes or fewer live in the field record itself. Everything
//! else is written to the field data blob and the record holds its offset.
//! Struct and list fields are resolved by [`super::tree`], not here.

use std::borrow::Cow;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use encoding_rs::WINDOWS_1252;

use super::header::Section;
use super::types::{
    FieldType, FieldValue, LocString, LocalizedText, RESREF_MAX_LEN, ResRef, STRREF_NONE,
};
use crate::error::{Error, Result};

/// Decode a value stored directly in the data slot.
///
/// Returns `None` for types that are not stored inline.
#[must_use]
pub fn decode_inline(field_type: FieldType, data: u32) -> Option<FieldValue> {
    let bytes = data.to_le_bytes();
    Some(match field_type {
        FieldType::Byte => FieldValue::Byte(bytes[0]),
        FieldType::Char => FieldValue::Char(bytes[0] as i8),
        FieldType::Word => FieldValue::Word(u16::from_le_bytes([bytes[0], bytes[1]])),
        FieldType::Short => FieldValue::Short(i16::from_le_bytes([bytes[0], bytes[1]])),
        FieldType::Dword => FieldValue::Dword(data),
        FieldType::Int => FieldValue::Int(data as i32),
        FieldType::Float => FieldValue::Float(f32::from_bits(data)),
        _ => return None,
    })
}

/// Encode a value into the data slot.
///
/// Returns `None` for values that are not stored inline.
#[must_use]
pub fn encode_inline(value: &FieldValue) -> Option<u32> {
    Some(match value {
        FieldValue::Byte(v) => u32::from(*v),
        FieldValue::Char(v) => u32::from(*v as u8),
        FieldValue::Word(v) => u32::from(*v),
        FieldValue::Short(v) => u32::from(*v as u16),
        FieldValue::Dword(v) => *v,
        FieldValue::Int(v) => *v as u32,
        FieldValue::Float(v) => v.to_bits(),
        _ => return None,
    })
}

/// Decode an out-of-line value at `offset` in the field data blob.
///
/// # Errors
/// Returns [`Error::ValueOutOfBounds`] if the value runs past the end of the
/// blob, [`Error::InvalidResRef`] for an over-long resource reference, and
/// [`Error::NotBlobType`] for inline, struct and list types.
pub fn decode_blob(
    field_type: FieldType,
    blob: &[u8],
    offset: u32,
    field_index: usize,
) -> Result<FieldValue> {
    let mut reader = BlobReader {
        blob,
        pos: offset as usize,
        start: offset,
        field_index,
    };

    Ok(match field_type {
        FieldType::Dword64 => FieldValue::Dword64(reader.u64()?),
        FieldType::Int64 => FieldValue::Int64(reader.u64()? as i64),
        FieldType::Double => FieldValue::Double(f64::from_bits(reader.u64()?)),
        FieldType::String => {
            let len = reader.u32()? as usize;
            FieldValue::String(decode_text(reader.bytes(len)?))
        }
        FieldType::ResRef => {
            let len = reader.u8()? as usize;
            if len > RESREF_MAX_LEN {
                return Err(Error::InvalidResRef {
                    field_index,
                    length: len,
                });
            }
            FieldValue::ResRef(ResRef::from_decoded(decode_text(reader.bytes(len)?)))
        }
        FieldType::LocString => {
            let total = reader.u32()? as usize;
            // Bound the rest of the read by the declared total size.
            let body_end = reader.pos.checked_add(total).filter(|&end| end <= blob.len());
            if body_end.is_none() {
                return Err(reader.out_of_bounds());
            }
            let strref = reader.u32()?;
            let count = reader.u32()?;
            let mut entries = Vec::new();
            for _ in 0..count {
                let language_id = reader.u32()?;
                let len = reader.u32()? as usize;
                let text = decode_text(reader.bytes(len)?);
                entries.push(LocalizedText { language_id, text });
            }
            FieldValue::LocString(LocString {
                strref: (strref != STRREF_NONE).then_some(strref),
                entries,
            })
        }
        FieldType::Void => {
            let len = reader.u32()? as usize;
            FieldValue::Void(reader.bytes(len)?.to_vec())
        }
        FieldType::Byte
        | FieldType::Char
        | FieldType::Word
        | FieldType::Short
        | FieldType::Dword
        | FieldType::Int
        | FieldType::Float
        | FieldType::Struct
        | FieldType::List => return Err(Error::NotBlobType { field_type }),
    })
}

/// Append an out-of-line value to the field data blob.
///
/// # Errors
/// Returns [`Error::UnmappableText`] for text outside Windows-1252,
/// [`Error::ResRefTooLong`] for an over-long resource reference, and
/// [`Error::NotBlobType`] for inline, struct and list values.
pub fn encode_blob(value: &FieldValue, out: &mut Vec<u8>) -> Result<()> {
    match value {
        FieldValue::Dword64(v) => out.write_u64::<LittleEndian>(*v)?,
        FieldValue::Int64(v) => out.write_i64::<LittleEndian>(*v)?,
        FieldValue::Double(v) => out.write_f64::<LittleEndian>(*v)?,
        FieldValue::String(s) => {
            let bytes = encode_text(s)?;
            out.write_u32::<LittleEndian>(len_u32(bytes.len())?)?;
            out.extend_from_slice(&bytes);
        }
        FieldValue::ResRef(r) => {
            let bytes = encode_text(r.as_str())?;
            if bytes.len() > RESREF_MAX_LEN {
                return Err(Error::ResRefTooLong {
                    value: r.as_str().to_string(),
                });
            }
            out.push(bytes.len() as u8);
            out.extend_from_slice(&bytes);
        }
        FieldValue::LocString(loc) => {
            let mut body = Vec::new();
            body.write_u32::<LittleEndian>(loc.strref_raw())?;
            body.write_u32::<LittleEndian>(len_u32(loc.entries.len())?)?;
            for entry in &loc.entries {
                let bytes = encode_text(&entry.text)?;
                body.write_u32::<LittleEndian>(entry.language_id)?;
                body.write_u32::<LittleEndian>(len_u32(bytes.len())?)?;
                body.extend_from_slice(&bytes);
            }
            out.write_u32::<LittleEndian>(len_u32(body.len())?)?;
            out.extend_from_slice(&body);
        }
        FieldValue::Void(bytes) => {
            out.write_u32::<LittleEndian>(len_u32(bytes.len())?)?;
            out.extend_from_slice(bytes);
        }
        FieldValue::Byte(_)
        | FieldValue::Char(_)
        | FieldValue::Word(_)
        | FieldValue::Short(_)
        | FieldValue::Dword(_)
        | FieldValue::Int(_)
        | FieldValue::Float(_)
        | FieldValue::Struct(_)
        | FieldValue::List(_) => {
            return Err(Error::NotBlobType {
                field_type: value.field_type(),
            });
        }
    }
    Ok(())
}

/// Windows-1252 bytes to text. Every byte maps to a character, so this never fails.
fn decode_text(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

fn encode_text(text: &str) -> Result<Cow<'_, [u8]>> {
    let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
    if unmappable {
        return Err(Error::UnmappableText {
            text: text.to_string(),
        });
    }
    Ok(bytes)
}

fn len_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::SectionTooLarge {
        section: Section::FieldData,
        length: len,
    })
}

/// Bounds-checked reads from the field data blob.
struct BlobReader<'a> {
    blob: &'a [u8],
    pos: usize,
    start: u32,
    field_index: usize,
}

impl<'a> BlobReader<'a> {
    fn out_of_bounds(&self) -> Error {
        Error::ValueOutOfBounds {
            section: Section::FieldData,
            field_index: self.field_index,
            offset: u64::from(self.start),
            section_len: self.blob.len(),
        }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or_else(|| self.out_of_bounds())?;
        let slice = self.blob.get(self.pos..end).ok_or_else(|| self.out_of_bounds())?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.bytes(4)?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.bytes(8)?))
    }
}
