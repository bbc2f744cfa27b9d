//! Field types and values carried by GFF containers

use std::fmt;

use serde::{Deserialize, Serialize};

use super::tree::GffStruct;
use crate::error::{Error, Result};

/// Maximum byte length of a resource reference.
pub const RESREF_MAX_LEN: usize = 16;

/// String-table reference meaning "no string-table entry".
pub const STRREF_NONE: u32 = 0xFFFF_FFFF;

/// Wire type of a field record.
///
/// The discriminant is the on-disk type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum FieldType {
    Byte = 0,
    Char = 1,
    Word = 2,
    Short = 3,
    Dword = 4,
    Int = 5,
    Dword64 = 6,
    Int64 = 7,
    Float = 8,
    Double = 9,
    String = 10,
    ResRef = 11,
    LocString = 12,
    Void = 13,
    Struct = 14,
    List = 15,
}

impl FieldType {
    /// Map a raw type code, or `None` if the code is unknown.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Byte,
            1 => Self::Char,
            2 => Self::Word,
            3 => Self::Short,
            4 => Self::Dword,
            5 => Self::Int,
            6 => Self::Dword64,
            7 => Self::Int64,
            8 => Self::Float,
            9 => Self::Double,
            10 => Self::String,
            11 => Self::ResRef,
            12 => Self::LocString,
            13 => Self::Void,
            14 => Self::Struct,
            15 => Self::List,
            _ => return None,
        })
    }

    #[must_use]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Whether the value lives directly in the field record's data slot.
    #[must_use]
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::Char
                | Self::Word
                | Self::Short
                | Self::Dword
                | Self::Int
                | Self::Float
        )
    }

    /// Whether the value lives in the field data blob.
    #[must_use]
    pub fn is_out_of_line(self) -> bool {
        !self.is_inline() && !matches!(self, Self::Struct | Self::List)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "BYTE",
            Self::Char => "CHAR",
            Self::Word => "WORD",
            Self::Short => "SHORT",
            Self::Dword => "DWORD",
            Self::Int => "INT",
            Self::Dword64 => "DWORD64",
            Self::Int64 => "INT64",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::String => "CExoString",
            Self::ResRef => "ResRef",
            Self::LocString => "CExoLocString",
            Self::Void => "VOID",
            Self::Struct => "Struct",
            Self::List => "List",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resource reference: a short, case-insensitive resource name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResRef(String);

impl ResRef {
    /// Create a resource reference, rejecting names longer than 16 bytes.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.len() > RESREF_MAX_LEN {
            return Err(Error::ResRefTooLong { value });
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build from text already known to fit, as produced by the value decoder.
    pub(crate) fn from_decoded(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ResRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One language variant of a localized string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    /// Language id as stored: `language * 2 + gender`.
    pub language_id: u32,
    pub text: String,
}

impl LocalizedText {
    #[must_use]
    pub fn new(language: u32, feminine: bool, text: impl Into<String>) -> Self {
        Self {
            language_id: language * 2 + u32::from(feminine),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn language(&self) -> u32 {
        self.language_id / 2
    }

    #[must_use]
    pub fn is_feminine(&self) -> bool {
        self.language_id % 2 == 1
    }
}

/// A localized string: an optional string-table reference plus inline
/// per-language text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocString {
    /// String-table reference, `None` when stored as `0xFFFFFFFF`.
    pub strref: Option<u32>,
    pub entries: Vec<LocalizedText>,
}

impl LocString {
    /// A localized string with a single English (language 0) entry.
    #[must_use]
    pub fn english(text: impl Into<String>) -> Self {
        Self {
            strref: None,
            entries: vec![LocalizedText::new(0, false, text)],
        }
    }

    /// Text for a language id, if present.
    #[must_use]
    pub fn get(&self, language_id: u32) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.language_id == language_id)
            .map(|e| e.text.as_str())
    }

    /// The first inline text, whatever its language.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.entries.first().map(|e| e.text.as_str())
    }

    /// Replace or add the text for a language id.
    pub fn set(&mut self, language_id: u32, text: impl Into<String>) {
        let text = text.into();
        match self.entries.iter_mut().find(|e| e.language_id == language_id) {
            Some(entry) => entry.text = text,
            None => self.entries.push(LocalizedText { language_id, text }),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strref.is_none() && self.entries.iter().all(|e| e.text.is_empty())
    }

    pub(crate) fn strref_raw(&self) -> u32 {
        self.strref.unwrap_or(STRREF_NONE)
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum FieldValue {
    Byte(u8),
    Char(i8),
    Word(u16),
    Short(i16),
    Dword(u32),
    Int(i32),
    Dword64(u64),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    ResRef(ResRef),
    LocString(LocString),
    Void(Vec<u8>),
    Struct(Box<GffStruct>),
    List(Vec<GffStruct>),
}

impl FieldValue {
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Byte(_) => FieldType::Byte,
            Self::Char(_) => FieldType::Char,
            Self::Word(_) => FieldType::Word,
            Self::Short(_) => FieldType::Short,
            Self::Dword(_) => FieldType::Dword,
            Self::Int(_) => FieldType::Int,
            Self::Dword64(_) => FieldType::Dword64,
            Self::Int64(_) => FieldType::Int64,
            Self::Float(_) => FieldType::Float,
            Self::Double(_) => FieldType::Double,
            Self::String(_) => FieldType::String,
            Self::ResRef(_) => FieldType::ResRef,
            Self::LocString(_) => FieldType::LocString,
            Self::Void(_) => FieldType::Void,
            Self::Struct(_) => FieldType::Struct,
            Self::List(_) => FieldType::List,
        }
    }
}
