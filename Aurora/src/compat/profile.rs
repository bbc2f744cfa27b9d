//! Layout detection
//!
//! Inspects a decoded file and works out which layout choices produced it,
//! so that re-encoding with [`ReferencePolicy::from_profile`] reproduces the
//! original bytes.
//!
//! [`ReferencePolicy::from_profile`]: super::ReferencePolicy::from_profile

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::flat::FlatTree;
use super::ordering::StructOrdering;
use super::type_codes::TypeCodeRule;
use crate::error::Result;
use crate::formats::gff::GffFile;

/// The layout choices observed in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutProfile {
    /// The built-in ordering that numbers the structs exactly as the file
    /// does, if any.
    pub ordering: Option<StructOrdering>,
    /// The built-in type code rule that reproduces every non-root type
    /// code without a learned map, if any.
    pub type_codes: Option<TypeCodeRule>,
    /// Field count → type code, as observed on non-root structs.
    pub shape_codes: BTreeMap<u32, u32>,
    /// Every shape was seen with a single type code.
    pub consistent_shapes: bool,
    /// Some out-of-line fields share one field-data offset.
    pub shared_values: bool,
    /// The label table, in file order.
    pub labels: Vec<String>,
}

impl LayoutProfile {
    /// Detect the layout of a decoded file.
    ///
    /// # Errors
    /// Returns a structural error if the file does not resolve to a tree.
    pub fn detect(file: &GffFile) -> Result<Self> {
        let resolved = file.resolve()?;
        let tree = FlatTree::build(&resolved.root);

        let ordering = if resolved.sources.len() == file.structs.len() {
            StructOrdering::ALL.into_iter().find(|ordering| {
                ordering
                    .order(&tree)
                    .iter()
                    .enumerate()
                    .all(|(index, &id)| resolved.sources[id] as usize == index)
            })
        } else {
            None
        };

        let mut shape_codes = BTreeMap::new();
        let mut consistent_shapes = true;
        for s in tree.iter().skip(1) {
            let code = *shape_codes.entry(s.field_count()).or_insert(s.node.type_code);
            consistent_shapes &= code == s.node.type_code;
        }

        let no_shapes = BTreeMap::new();
        let type_codes = [TypeCodeRule::ShapeFrequency, TypeCodeRule::ListPosition]
            .into_iter()
            .find(|rule| {
                let codes = rule.assign(&tree, &no_shapes, &mut Vec::new());
                tree.iter()
                    .enumerate()
                    .skip(1)
                    .all(|(id, s)| codes[id] == s.node.type_code)
            });

        let mut offsets = HashSet::new();
        let shared_values = file
            .fields
            .iter()
            .filter(|f| f.field_type.is_out_of_line())
            .any(|f| !offsets.insert(f.data));

        let profile = Self {
            ordering,
            type_codes,
            shape_codes,
            consistent_shapes,
            shared_values,
            labels: file.labels.iter().map(|l| l.as_str().to_string()).collect(),
        };
        tracing::debug!(
            "Detected layout: ordering {:?}, type codes {:?}, {} shapes, shared values {}, {} labels",
            profile.ordering,
            profile.type_codes,
            profile.shape_codes.len(),
            profile.shared_values,
            profile.labels.len()
        );
        Ok(profile)
    }
}
