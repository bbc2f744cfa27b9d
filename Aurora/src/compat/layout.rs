//! Physical layout of a struct tree
//!
//! Turns a [`GffStruct`] tree into raw [`GffFile`] tables under a
//! [`CompatibilityPolicy`]. The fields of each struct are emitted
//! consecutively, structs in the order the policy chooses, so the field
//! array, label table, field-data blob and both index tables all follow
//! from that one order.

use std::collections::{HashMap, HashSet};

use super::flat::FlatTree;
use super::policy::{CompatWarning, CompatibilityPolicy};
use crate::error::{Error, Result};
use crate::formats::gff::{
    EMPTY_FIELD_REF, FieldRecord, FieldValue, GffFile, GffStruct, LabelTable, Section,
    StructRecord, encode_blob, encode_inline,
};

/// Lay out `root` as raw tables.
///
/// # Errors
/// Returns [`Error::InvalidStructOrder`] if the policy's order is not a
/// permutation starting at the root, or an encode error for a bad label,
/// unmappable text or an oversized section.
pub fn lay_out(
    root: &GffStruct,
    file_type: [u8; 4],
    policy: &dyn CompatibilityPolicy,
) -> Result<(GffFile, Vec<CompatWarning>)> {
    let tree = FlatTree::build(root);
    let order = policy.struct_order(&tree);
    let index_of = invert_order(&order, tree.len(), policy.name())?;

    let mut warnings = Vec::new();
    let type_codes = policy.type_codes(&tree, &mut warnings);
    if type_codes.len() != tree.len() {
        return Err(Error::InvalidStructOrder {
            policy: policy.name().to_string(),
            reason: format!("{} type codes for {} structs", type_codes.len(), tree.len()),
        });
    }

    let mut builder = TableBuilder {
        file: GffFile::new(file_type),
        labels: preferred_labels(&tree, policy.label_order())?,
        shared: policy.dedup_values().then(HashMap::new),
        scratch: Vec::new(),
    };

    for &id in &order {
        let flat = tree.get(id);
        let mut children = flat.children.iter();
        let first_field = builder.file.fields.len();

        for field in &flat.node.fields {
            let label_index = builder.labels.intern(&field.label)?;
            let data = match &field.value {
                FieldValue::Struct(_) => {
                    let child = children.next().copied().unwrap_or_default();
                    index_of[child]
                }
                FieldValue::List(items) => {
                    let indices = &mut builder.file.list_indices;
                    let offset = to_u32(indices.len(), Section::ListIndices)?;
                    push_u32(indices, to_u32(items.len(), Section::ListIndices)?);
                    for _ in items {
                        let child = children.next().copied().unwrap_or_default();
                        push_u32(indices, index_of[child]);
                    }
                    offset
                }
                value => match encode_inline(value) {
                    Some(data) => data,
                    None => builder.push_value(value)?,
                },
            };
            builder.file.fields.push(FieldRecord {
                field_type: field.value.field_type(),
                label_index,
                data,
            });
        }

        let field_count = to_u32(flat.node.fields.len(), Section::Fields)?;
        let field_ref = match field_count {
            0 => EMPTY_FIELD_REF,
            1 => to_u32(first_field, Section::Fields)?,
            _ => {
                let indices = &mut builder.file.field_indices;
                let offset = to_u32(indices.len(), Section::FieldIndices)?;
                for field_index in first_field..builder.file.fields.len() {
                    push_u32(indices, to_u32(field_index, Section::Fields)?);
                }
                offset
            }
        };
        builder.file.structs.push(StructRecord {
            type_code: type_codes[id],
            field_ref,
            field_count,
        });
    }

    let mut file = builder.file;
    file.labels = builder.labels.into_labels()?;
    Ok((file, warnings))
}

/// A label table seeded with the policy's preferred labels that the tree
/// actually uses.
fn preferred_labels(tree: &FlatTree<'_>, order: &[String]) -> Result<LabelTable> {
    let mut labels = LabelTable::new();
    if order.is_empty() {
        return Ok(labels);
    }
    let used: HashSet<&str> = tree
        .iter()
        .flat_map(|s| s.node.fields.iter().map(|f| f.label.as_str()))
        .collect();
    for label in order.iter().filter(|l| used.contains(l.as_str())) {
        labels.intern(label)?;
    }
    Ok(labels)
}

struct TableBuilder {
    file: GffFile,
    labels: LabelTable,
    /// Encoded value → offset, when identical values are shared.
    shared: Option<HashMap<Vec<u8>, u32>>,
    scratch: Vec<u8>,
}

impl TableBuilder {
    /// Append an out-of-line value to the field-data section, returning its
    /// offset.
    fn push_value(&mut self, value: &FieldValue) -> Result<u32> {
        self.scratch.clear();
        encode_blob(value, &mut self.scratch)?;

        let known = self.shared.as_ref().and_then(|s| s.get(&self.scratch));
        if let Some(offset) = known {
            return Ok(*offset);
        }
        let offset = to_u32(self.file.field_data.len(), Section::FieldData)?;
        self.file.field_data.extend_from_slice(&self.scratch);
        if let Some(shared) = self.shared.as_mut() {
            shared.insert(self.scratch.clone(), offset);
        }
        Ok(offset)
    }
}

/// Map flat ids to struct indices, checking the order is a permutation
/// that puts the root first.
fn invert_order(order: &[usize], len: usize, policy: &str) -> Result<Vec<u32>> {
    let invalid = |reason: String| Error::InvalidStructOrder {
        policy: policy.to_string(),
        reason,
    };
    if order.len() != len {
        return Err(invalid(format!("{} entries for {len} structs", order.len())));
    }
    if order.first() != Some(&0) {
        return Err(invalid("the root struct must be first".to_string()));
    }

    let mut index_of = vec![u32::MAX; len];
    for (index, &id) in order.iter().enumerate() {
        let slot = index_of
            .get_mut(id)
            .ok_or_else(|| invalid(format!("struct id {id} out of range")))?;
        if *slot != u32::MAX {
            return Err(invalid(format!("struct id {id} appears twice")));
        }
        *slot = to_u32(index, Section::Structs)?;
    }
    Ok(index_of)
}

fn to_u32(length: usize, section: Section) -> Result<u32> {
    u32::try_from(length).map_err(|_| Error::SectionTooLarge { section, length })
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::flat::tests::sample_tree;
    use crate::compat::ordering::StructOrdering;
    use crate::compat::policy::ReferencePolicy;
    use crate::formats::gff::{FieldType, ROOT_STRUCT_TYPE};
    use pretty_assertions::assert_eq;

    struct FixedOrder(Vec<usize>);

    impl CompatibilityPolicy for FixedOrder {
        fn name(&self) -> &str {
            "fixed"
        }
        fn struct_order(&self, _tree: &FlatTree<'_>) -> Vec<usize> {
            self.0.clone()
        }
        fn type_codes(
            &self,
            tree: &FlatTree<'_>,
            _warnings: &mut Vec<CompatWarning>,
        ) -> Vec<u32> {
            vec![0; tree.len()]
        }
    }

    fn u32s(bytes: &[u8]) -> Vec<u32> {
        bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_layout_depth_first() {
        let root = sample_tree();
        let policy = ReferencePolicy::provisional().with_ordering(StructOrdering::DepthFirst);
        let (file, warnings) = lay_out(&root, *b"GFF ", &policy).unwrap();
        assert!(warnings.is_empty());

        assert_eq!(file.structs.len(), 5);
        assert_eq!(file.structs[0].type_code, ROOT_STRUCT_TYPE);
        // root: two list fields at 0..2, listed in field indices at offset 0
        assert_eq!(file.structs[0].field_count, 2);
        assert_eq!(file.structs[0].field_ref, 0);
        // a0: one struct field → field_ref is the field index itself
        assert_eq!(file.structs[1].field_count, 1);
        assert_eq!(file.structs[1].field_ref, 2);
        assert_eq!(file.fields[2].field_type, FieldType::Struct);
        assert_eq!(file.fields[2].data, 2);
        // b0: no fields
        assert_eq!(file.structs[4].field_ref, EMPTY_FIELD_REF);

        assert_eq!(u32s(&file.list_indices), vec![2, 1, 3, 1, 4]);
        assert_eq!(file.fields[0].data, 0);
        assert_eq!(file.fields[1].data, 12);
        assert_eq!(u32s(&file.field_indices), vec![0, 1, 4, 5]);
        assert_eq!(file.structs[3].field_ref, 8);

        let labels: Vec<&str> = file.labels.iter().map(|l| l.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "S", "X", "Y"]);
    }

    #[test]
    fn test_layout_resolves_back_to_tree() {
        let root = sample_tree();
        for ordering in StructOrdering::ALL {
            let policy = ReferencePolicy::provisional()
                .with_ordering(ordering)
                .with_type_codes(crate::compat::TypeCodeRule::Preserve);
            let (file, _) = lay_out(&root, *b"GFF ", &policy).unwrap();
            assert_eq!(file.to_tree().unwrap(), root, "{ordering}");
        }
    }

    #[test]
    fn test_dedup_shares_identical_values() {
        let root = GffStruct::root()
            .with("A", FieldValue::String("same".into()))
            .with("B", FieldValue::String("same".into()))
            .with("C", FieldValue::Dword64(1));
        let plain = lay_out(&root, *b"GFF ", &ReferencePolicy::provisional()).unwrap().0;
        let dedup = ReferencePolicy::provisional().with_dedup(true);
        let shared = lay_out(&root, *b"GFF ", &dedup).unwrap().0;
        assert_eq!(plain.field_data.len(), 8 + 8 + 8);
        assert_eq!(shared.field_data.len(), 8 + 8);
        assert_eq!(shared.fields[0].data, shared.fields[1].data);
        assert_eq!(shared.to_tree().unwrap(), plain.to_tree().unwrap());
    }

    #[test]
    fn test_invalid_orders_rejected() {
        let root = sample_tree();
        let orders = [
            vec![0, 1, 2, 3],
            vec![1, 0, 2, 3, 4],
            vec![0, 1, 1, 3, 4],
            vec![0, 1, 2, 3, 9],
        ];
        for order in orders {
            let err = lay_out(&root, *b"GFF ", &FixedOrder(order)).unwrap_err();
            assert!(matches!(err, Error::InvalidStructOrder { .. }), "{err}");
        }
    }

    #[test]
    fn test_preferred_labels_come_first() {
        let root = sample_tree();
        let policy = ReferencePolicy {
            label_order: vec!["Y".into(), "Unused".into(), "A".into()],
            ..ReferencePolicy::provisional()
        };
        let (file, _) = lay_out(&root, *b"GFF ", &policy).unwrap();
        let labels: Vec<&str> = file.labels.iter().map(|l| l.as_str()).collect();
        assert_eq!(labels, vec!["Y", "A", "B", "S", "X"]);
        let (plain, _) = lay_out(&root, *b"GFF ", &ReferencePolicy::provisional()).unwrap();
        assert_eq!(file.to_tree().unwrap(), plain.to_tree().unwrap());
    }

    #[test]
    fn test_bad_label_is_encode_error() {
        let root = GffStruct::root().with("ThisLabelIsFarTooLong", FieldValue::Byte(0));
        let err = lay_out(&root, *b"GFF ", &ReferencePolicy::provisional()).unwrap_err();
        assert!(matches!(err, Error::InvalidLabel { .. }));
    }
}
