//! Resolved struct/field graph
//!
//! A [`GffStruct`] owns its fields, and nested struct and list values own
//! their structs, so the tree carries no indices at all. Physical layout is
//! recomputed on write by [`crate::compat`].

use serde::{Deserialize, Serialize};

use super::document::{GffFile, ROOT_STRUCT_TYPE};
use super::types::{FieldType, FieldValue};
use super::value::{decode_blob, decode_inline};
use crate::error::{Error, Result};

/// A labelled field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GffField {
    pub label: String,
    pub value: FieldValue,
}

impl GffField {
    pub fn new(label: impl Into<String>, value: FieldValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// A struct: a type code plus an ordered list of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GffStruct {
    pub type_code: u32,
    pub fields: Vec<GffField>,
}

impl GffStruct {
    #[must_use]
    pub fn new(type_code: u32) -> Self {
        Self {
            type_code,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn root() -> Self {
        Self::new(ROOT_STRUCT_TYPE)
    }

    /// First field with the given label.
    #[must_use]
    pub fn field(&self, label: &str) -> Option<&GffField> {
        self.fields.iter().find(|f| f.label == label)
    }

    /// Value of the first field with the given label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&FieldValue> {
        self.field(label).map(|f| &f.value)
    }

    pub fn push(&mut self, label: impl Into<String>, value: FieldValue) {
        self.fields.push(GffField::new(label, value));
    }

    /// Builder-style [`GffStruct::push`].
    #[must_use]
    pub fn with(mut self, label: impl Into<String>, value: FieldValue) -> Self {
        self.push(label, value);
        self
    }

    /// Number of structs in this subtree, this one included.
    #[must_use]
    pub fn struct_count(&self) -> usize {
        1 + self
            .fields
            .iter()
            .map(|f| match &f.value {
                FieldValue::Struct(s) => s.struct_count(),
                FieldValue::List(items) => items.iter().map(GffStruct::struct_count).sum(),
                _ => 0,
            })
            .sum::<usize>()
    }

    /// Number of fields in this subtree.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
            + self
                .fields
                .iter()
                .map(|f| match &f.value {
                    FieldValue::Struct(s) => s.field_count(),
                    FieldValue::List(items) => items.iter().map(GffStruct::field_count).sum(),
                    _ => 0,
                })
                .sum::<usize>()
    }
}

/// How many times the struct count a resolved tree may grow to through
/// shared structs.
pub const MAX_SHARED_EXPANSION: usize = 8;

/// A resolved tree along with, for each struct in pre-order, the struct
/// index it was read from.
#[derive(Debug, Clone)]
pub struct ResolvedTree {
    pub root: GffStruct,
    pub sources: Vec<u32>,
}

impl GffFile {
    /// Resolve the raw tables into a struct tree rooted at struct 0.
    ///
    /// # Errors
    /// Returns a structural error for dangling indices, out-of-bounds values,
    /// or a struct that is reachable from itself.
    pub fn to_tree(&self) -> Result<GffStruct> {
        Ok(self.resolve()?.root)
    }

    /// Like [`GffFile::to_tree`], also reporting where each struct came from.
    ///
    /// Shared structs are copied at each reference, up to
    /// [`MAX_SHARED_EXPANSION`] times the struct count in total.
    pub fn resolve(&self) -> Result<ResolvedTree> {
        if self.structs.is_empty() {
            return Err(Error::MissingRootStruct);
        }
        let mut resolver = Resolver {
            file: self,
            on_path: vec![false; self.structs.len()],
            seen: vec![false; self.structs.len()],
            sources: Vec::with_capacity(self.structs.len()),
            limit: self.structs.len().saturating_mul(MAX_SHARED_EXPANSION),
        };
        let root = resolver.resolve_struct(0)?;

        let unused = resolver.seen.iter().filter(|s| !**s).count();
        if unused > 0 {
            tracing::warn!("{unused} structs are not reachable from the root and will be dropped");
        }
        Ok(ResolvedTree {
            root,
            sources: resolver.sources,
        })
    }
}

struct Resolver<'a> {
    file: &'a GffFile,
    on_path: Vec<bool>,
    seen: Vec<bool>,
    sources: Vec<u32>,
    limit: usize,
}

impl Resolver<'_> {
    fn resolve_struct(&mut self, index: u32) -> Result<GffStruct> {
        let i = index as usize;
        if self.on_path[i] {
            return Err(Error::StructCycle {
                struct_index: index,
            });
        }
        if self.seen[i] {
            tracing::warn!("struct {index} is referenced more than once; duplicating it");
        }
        if self.sources.len() >= self.limit {
            return Err(Error::ExpansionLimit { limit: self.limit });
        }
        self.on_path[i] = true;
        self.seen[i] = true;
        self.sources.push(index);

        let record = self.file.structs[i];
        let field_indices = self.file.struct_field_indices(i)?;
        let mut fields = Vec::with_capacity(field_indices.len());
        for field_index in field_indices {
            fields.push(self.resolve_field(field_index as usize)?);
        }

        self.on_path[i] = false;
        Ok(GffStruct {
            type_code: record.type_code,
            fields,
        })
    }

    fn resolve_field(&mut self, field_index: usize) -> Result<GffField> {
        let record = self.file.fields[field_index];
        let label = self.file.field_label(field_index)?.as_str().to_string();

        let value = match record.field_type {
            FieldType::Struct => {
                self.file.check_struct_index(field_index, record.data)?;
                FieldValue::Struct(Box::new(self.resolve_struct(record.data)?))
            }
            FieldType::List => {
                let indices = self.file.list_struct_indices(field_index, record.data)?;
                let mut items = Vec::with_capacity(indices.len());
                for index in indices {
                    items.push(self.resolve_struct(index)?);
                }
                FieldValue::List(items)
            }
            ty if ty.is_inline() => {
                decode_inline(ty, record.data).unwrap_or(FieldValue::Dword(record.data))
            }
            ty => decode_blob(ty, &self.file.field_data, record.data, field_index)?,
        };
        Ok(GffField { label, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gff::document::{FieldRecord, Label, StructRecord};

    fn list_bytes(lists: &[&[u32]]) -> Vec<u8> {
        let mut out = Vec::new();
        for list in lists {
            out.extend_from_slice(&(list.len() as u32).to_le_bytes());
            for i in *list {
                out.extend_from_slice(&i.to_le_bytes());
            }
        }
        out
    }

    fn record(type_code: u32, field_ref: u32, field_count: u32) -> StructRecord {
        StructRecord {
            type_code,
            field_ref,
            field_count,
        }
    }

    fn field(field_type: FieldType, label_index: u32, data: u32) -> FieldRecord {
        FieldRecord {
            field_type,
            label_index,
            data,
        }
    }

    /// Root with a list of two one-field children.
    fn sample() -> GffFile {
        let mut file = GffFile::new(*b"GFF ");
        file.structs = vec![
            record(ROOT_STRUCT_TYPE, 0, 1),
            record(0, 1, 1),
            record(0, 2, 1),
        ];
        file.fields = vec![
            field(FieldType::List, 0, 0),
            field(FieldType::Short, 1, 0xFFFF),
            field(FieldType::Short, 1, 3),
        ];
        file.labels = vec![Label::new("Items").unwrap(), Label::new("N").unwrap()];
        file.list_indices = list_bytes(&[&[1, 2]]);
        file
    }

    /// `depth` structs, each listing the next one twice.
    fn doubling_chain(depth: u32) -> GffFile {
        let mut file = GffFile::new(*b"GFF ");
        let mut lists: Vec<Vec<u32>> = Vec::new();
        let mut offset = 0;
        for i in 0..depth {
            let type_code = if i == 0 { ROOT_STRUCT_TYPE } else { 0 };
            file.structs.push(record(type_code, i, 1));
            let next = if i + 1 < depth { vec![i + 1, i + 1] } else { Vec::new() };
            file.fields.push(field(FieldType::List, 0, offset));
            offset += 4 + 4 * next.len() as u32;
            lists.push(next);
        }
        file.labels = vec![Label::new("Next").unwrap()];
        let slices: Vec<&[u32]> = lists.iter().map(Vec::as_slice).collect();
        file.list_indices = list_bytes(&slices);
        file
    }

    #[test]
    fn test_resolve_list() {
        let resolved = sample().resolve().unwrap();
        let FieldValue::List(items) = resolved.root.get("Items").unwrap() else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("N"), Some(&FieldValue::Short(-1)));
        assert_eq!(items[1].get("N"), Some(&FieldValue::Short(3)));
        assert_eq!(resolved.sources, vec![0, 1, 2]);
        assert_eq!(resolved.root.struct_count(), 3);
        assert_eq!(resolved.root.field_count(), 3);
    }

    #[test]
    fn test_cycle_is_structural_error() {
        let mut file = sample();
        file.list_indices = list_bytes(&[&[1, 0]]);
        assert!(matches!(
            file.to_tree(),
            Err(Error::StructCycle { struct_index: 0 })
        ));
    }

    #[test]
    fn test_dangling_list_entry() {
        let mut file = sample();
        file.list_indices = list_bytes(&[&[1, 7]]);
        assert!(matches!(
            file.to_tree(),
            Err(Error::StructIndexOutOfRange {
                field_index: 0,
                struct_index: 7,
                struct_count: 3
            })
        ));
    }

    #[test]
    fn test_shared_struct_is_duplicated() {
        let mut file = sample();
        file.list_indices = list_bytes(&[&[1, 1]]);
        let resolved = file.resolve().unwrap();
        assert_eq!(resolved.sources, vec![0, 1, 1]);
        assert_eq!(resolved.root.struct_count(), 3);
    }

    #[test]
    fn test_bad_label_index() {
        let mut file = sample();
        file.fields[2].label_index = 9;
        assert!(matches!(
            file.to_tree(),
            Err(Error::LabelIndexOutOfRange {
                field_index: 2,
                label_index: 9,
                label_count: 2
            })
        ));
    }

    #[test]
    fn test_shallow_sharing_resolves() {
        // 4 levels expand to 15 structs, within 8 x 4.
        let resolved = doubling_chain(4).resolve().unwrap();
        assert_eq!(resolved.sources.len(), 15);
        assert_eq!(resolved.root.struct_count(), 15);
    }

    #[test]
    fn test_deep_sharing_hits_expansion_limit() {
        let file = doubling_chain(30);
        let err = file.to_tree().unwrap_err();
        assert!(matches!(err, Error::ExpansionLimit { limit: 240 }));
        assert_eq!(err.kind(), crate::ErrorKind::Structural);
    }
}
