//! Struct type code assignment
//!
//! Readers ignore struct type codes, but the reference toolset writes
//! specific values and byte-exact output has to reproduce them. The root
//! always gets [`ROOT_STRUCT_TYPE`]; every other struct gets a code from
//! the selected [`TypeCodeRule`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CompatWarning;
use super::flat::FlatTree;
use crate::formats::gff::ROOT_STRUCT_TYPE;

/// How non-root structs are given type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeCodeRule {
    /// Code by shape (field count). The most common shape gets 0, the rest
    /// are ranked by frequency, ties broken by the smaller field count.
    /// A learned shape map takes precedence over the ranking.
    #[default]
    ShapeFrequency,
    /// Code is the struct's position in its containing list, 0 for structs
    /// held by a struct field.
    ListPosition,
    /// Keep the code stored in the tree.
    Preserve,
}

impl TypeCodeRule {
    pub const ALL: [Self; 3] = [Self::ShapeFrequency, Self::ListPosition, Self::Preserve];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ShapeFrequency => "shape-frequency",
            Self::ListPosition => "list-position",
            Self::Preserve => "preserve",
        }
    }

    /// Type codes indexed by flat id.
    pub fn assign(
        self,
        tree: &FlatTree<'_>,
        known_shapes: &BTreeMap<u32, u32>,
        warnings: &mut Vec<CompatWarning>,
    ) -> Vec<u32> {
        let mut codes = match self {
            Self::ShapeFrequency => by_shape(tree, known_shapes, warnings),
            Self::ListPosition => tree
                .iter()
                .map(|s| s.list_position.map_or(0, |p| p as u32))
                .collect(),
            Self::Preserve => tree
                .iter()
                .enumerate()
                .map(|(id, s)| {
                    if id != 0 && s.node.type_code == ROOT_STRUCT_TYPE {
                        warnings.push(CompatWarning::ReservedTypeCode { struct_id: id });
                        0
                    } else {
                        s.node.type_code
                    }
                })
                .collect(),
        };

        let found = tree.root().node.type_code;
        if found != ROOT_STRUCT_TYPE {
            warnings.push(CompatWarning::RootTypeReplaced { found });
        }
        codes[0] = ROOT_STRUCT_TYPE;
        codes
    }
}

impl fmt::Display for TypeCodeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeCodeRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shape-frequency" | "shape" => Ok(Self::ShapeFrequency),
            "list-position" | "position" => Ok(Self::ListPosition),
            "preserve" => Ok(Self::Preserve),
            other => Err(format!(
                "unknown type code rule '{other}' (expected shape-frequency, list-position or preserve)"
            )),
        }
    }
}

/// Rank non-root shapes by how often they occur.
///
/// Returns `(field_count, occurrences)` pairs, most frequent first.
#[must_use]
pub fn rank_shapes(tree: &FlatTree<'_>) -> Vec<(u32, usize)> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for s in tree.iter().skip(1) {
        *counts.entry(s.field_count()).or_default() += 1;
    }
    let mut ranked: Vec<(u32, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}

fn by_shape(
    tree: &FlatTree<'_>,
    known_shapes: &BTreeMap<u32, u32>,
    warnings: &mut Vec<CompatWarning>,
) -> Vec<u32> {
    let mut shape_codes: BTreeMap<u32, u32> = BTreeMap::new();

    if known_shapes.is_empty() {
        let ranked = rank_shapes(tree);
        if let [(first, top), rest @ ..] = ranked.as_slice() {
            let tied: Vec<u32> = rest
                .iter()
                .take_while(|(_, n)| n == top)
                .map(|(fc, _)| *fc)
                .collect();
            if !tied.is_empty() {
                let mut field_counts = vec![*first];
                field_counts.extend(tied);
                warnings.push(CompatWarning::TiedShapeFrequency {
                    field_counts,
                    chosen: *first,
                });
            }
        }
        for (rank, (field_count, _)) in ranked.iter().enumerate() {
            shape_codes.insert(*field_count, rank as u32);
        }
    } else {
        shape_codes.extend(
            known_shapes
                .iter()
                .filter(|(_, code)| **code != ROOT_STRUCT_TYPE),
        );
        let mut used: BTreeSet<u32> = shape_codes.values().copied().collect();
        let mut after = used.last().copied();
        for s in tree.iter().skip(1) {
            let field_count = s.field_count();
            if shape_codes.contains_key(&field_count) {
                continue;
            }
            let type_code = match free_code(&used, after) {
                Some(code) => {
                    warnings.push(CompatWarning::NovelShape {
                        field_count,
                        type_code: code,
                    });
                    used.insert(code);
                    after = Some(code);
                    code
                }
                None => {
                    warnings.push(CompatWarning::TypeCodesExhausted { field_count });
                    0
                }
            };
            shape_codes.insert(field_count, type_code);
        }
    }

    tree.iter()
        .map(|s| shape_codes.get(&s.field_count()).copied().unwrap_or(0))
        .collect()
}

/// The first code above `after` that is neither taken nor reserved,
/// wrapping to the bottom of the range once.
fn free_code(used: &BTreeSet<u32>, after: Option<u32>) -> Option<u32> {
    let start = after.and_then(|code| code.checked_add(1)).unwrap_or(0);
    let usable = |code: &u32| *code != ROOT_STRUCT_TYPE && !used.contains(code);
    (start..ROOT_STRUCT_TYPE)
        .find(usable)
        .or_else(|| (0..start.min(ROOT_STRUCT_TYPE)).find(usable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::flat::tests::sample_tree;
    use crate::formats::gff::{FieldValue, GffStruct};

    // Sample shapes: a0 1 field, s 1 field, a1 2 fields, b0 0 fields.

    #[test]
    fn test_shape_frequency_ranking() {
        let root = sample_tree();
        let tree = FlatTree::build(&root);
        let mut warnings = Vec::new();
        let codes = TypeCodeRule::ShapeFrequency.assign(&tree, &BTreeMap::new(), &mut warnings);
        // one-field shape is most common; 0 and 2 tie at one each, smaller count wins
        assert_eq!(codes, vec![ROOT_STRUCT_TYPE, 0, 0, 2, 1]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_tied_top_shape_warns() {
        let root = GffStruct::root().with(
            "L",
            FieldValue::List(vec![
                GffStruct::new(0),
                GffStruct::new(0).with("X", FieldValue::Byte(0)),
            ]),
        );
        let tree = FlatTree::build(&root);
        let mut warnings = Vec::new();
        let codes = TypeCodeRule::ShapeFrequency.assign(&tree, &BTreeMap::new(), &mut warnings);
        assert_eq!(codes, vec![ROOT_STRUCT_TYPE, 0, 1]);
        assert_eq!(
            warnings,
            vec![CompatWarning::TiedShapeFrequency {
                field_counts: vec![0, 1],
                chosen: 0
            }]
        );
    }

    #[test]
    fn test_known_shapes_take_precedence() {
        let root = sample_tree();
        let tree = FlatTree::build(&root);
        let known = BTreeMap::from([(1, 7), (2, 3)]);
        let mut warnings = Vec::new();
        let codes = TypeCodeRule::ShapeFrequency.assign(&tree, &known, &mut warnings);
        assert_eq!(codes, vec![ROOT_STRUCT_TYPE, 7, 7, 3, 8]);
        assert_eq!(
            warnings,
            vec![CompatWarning::NovelShape {
                field_count: 0,
                type_code: 8
            }]
        );
    }

    #[test]
    fn test_novel_codes_skip_reserved_root_code() {
        let root = GffStruct::root().with(
            "L",
            FieldValue::List(vec![
                GffStruct::new(0).with("A", FieldValue::Byte(0)),
                GffStruct::new(0)
                    .with("A", FieldValue::Byte(0))
                    .with("B", FieldValue::Byte(0)),
                GffStruct::new(0),
            ]),
        );
        let tree = FlatTree::build(&root);
        let known = BTreeMap::from([(1, 0xFFFF_FFFE)]);
        let mut warnings = Vec::new();
        let codes = TypeCodeRule::ShapeFrequency.assign(&tree, &known, &mut warnings);
        assert_eq!(codes, vec![ROOT_STRUCT_TYPE, 0xFFFF_FFFE, 0, 1]);
        assert!(codes[1..].iter().all(|code| *code != ROOT_STRUCT_TYPE));
        assert_eq!(
            warnings,
            vec![
                CompatWarning::NovelShape {
                    field_count: 2,
                    type_code: 0
                },
                CompatWarning::NovelShape {
                    field_count: 0,
                    type_code: 1
                },
            ]
        );
    }

    #[test]
    fn test_free_code_wraps_and_skips_taken() {
        let used = BTreeSet::from([0xFFFF_FFFE, 0, 1]);
        assert_eq!(free_code(&used, Some(0xFFFF_FFFE)), Some(2));
        assert_eq!(free_code(&used, Some(1)), Some(2));
        assert_eq!(free_code(&BTreeSet::new(), None), Some(0));
        assert_eq!(free_code(&BTreeSet::new(), Some(ROOT_STRUCT_TYPE)), Some(0));
    }

    #[test]
    fn test_list_position() {
        let root = sample_tree();
        let tree = FlatTree::build(&root);
        let codes = TypeCodeRule::ListPosition.assign(&tree, &BTreeMap::new(), &mut Vec::new());
        assert_eq!(codes, vec![ROOT_STRUCT_TYPE, 0, 0, 1, 0]);
    }

    #[test]
    fn test_preserve_rejects_reserved_code_and_forces_root() {
        let root = GffStruct::new(5).with(
            "L",
            FieldValue::List(vec![GffStruct::new(ROOT_STRUCT_TYPE), GffStruct::new(9)]),
        );
        let tree = FlatTree::build(&root);
        let mut warnings = Vec::new();
        let codes = TypeCodeRule::Preserve.assign(&tree, &BTreeMap::new(), &mut warnings);
        assert_eq!(codes, vec![ROOT_STRUCT_TYPE, 0, 9]);
        assert_eq!(
            warnings,
            vec![
                CompatWarning::ReservedTypeCode { struct_id: 1 },
                CompatWarning::RootTypeReplaced { found: 5 },
            ]
        );
    }
}
