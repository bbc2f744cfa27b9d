//! Struct ordering strategies
//!
//! An ordering decides which struct index each struct of the tree is given
//! in the struct array. The root is always index 0.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::flat::FlatTree;

/// How structs are numbered when a tree is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructOrdering {
    /// Level by level, each level in field order.
    #[default]
    BreadthFirst,
    /// Pre-order: every struct is followed by its whole subtree.
    DepthFirst,
    /// The root, then every direct child of the root, then each of those
    /// children's descendants in pre-order.
    TopLevelFirst,
}

impl StructOrdering {
    /// All built-in orderings, the default first.
    pub const ALL: [Self; 3] = [Self::BreadthFirst, Self::DepthFirst, Self::TopLevelFirst];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::BreadthFirst => "breadth-first",
            Self::DepthFirst => "depth-first",
            Self::TopLevelFirst => "top-level-first",
        }
    }

    /// Flat ids listed in struct-index order.
    #[must_use]
    pub fn order(self, tree: &FlatTree<'_>) -> Vec<usize> {
        match self {
            Self::DepthFirst => (0..tree.len()).collect(),
            Self::BreadthFirst => {
                let mut order = Vec::with_capacity(tree.len());
                let mut queue = VecDeque::from([0]);
                while let Some(id) = queue.pop_front() {
                    order.push(id);
                    queue.extend(tree.get(id).children.iter().copied());
                }
                order
            }
            Self::TopLevelFirst => {
                let root = tree.root();
                let mut order = Vec::with_capacity(tree.len());
                order.push(0);
                order.extend(root.children.iter().copied());
                for &child in &root.children {
                    order.extend(child + 1..tree.get(child).subtree_end);
                }
                order
            }
        }
    }
}

impl fmt::Display for StructOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StructOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "breadth-first" | "bfs" => Ok(Self::BreadthFirst),
            "depth-first" | "dfs" => Ok(Self::DepthFirst),
            "top-level-first" | "top-level" => Ok(Self::TopLevelFirst),
            other => Err(format!(
                "unknown struct ordering '{other}' (expected breadth-first, depth-first or top-level-first)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::flat::tests::sample_tree;

    // Flat ids of the sample: 0 root, 1 a0, 2 s (under a0), 3 a1, 4 b0.

    #[test]
    fn test_depth_first() {
        let root = sample_tree();
        let tree = FlatTree::build(&root);
        assert_eq!(StructOrdering::DepthFirst.order(&tree), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_breadth_first() {
        let root = sample_tree();
        let tree = FlatTree::build(&root);
        assert_eq!(StructOrdering::BreadthFirst.order(&tree), vec![0, 1, 3, 4, 2]);
    }

    #[test]
    fn test_top_level_first() {
        let root = sample_tree();
        let tree = FlatTree::build(&root);
        assert_eq!(StructOrdering::TopLevelFirst.order(&tree), vec![0, 1, 3, 4, 2]);
    }

    #[test]
    fn test_top_level_first_differs_from_breadth_first_on_deep_trees() {
        use crate::formats::gff::{FieldValue, GffStruct};
        let leaf = || GffStruct::new(0).with("V", FieldValue::Byte(0));
        let mid = || {
            let inner = GffStruct::new(0).with("I", FieldValue::List(vec![leaf()]));
            GffStruct::new(0).with("L", FieldValue::List(vec![inner]))
        };
        let root = GffStruct::root().with("A", FieldValue::List(vec![mid(), mid()]));
        let tree = FlatTree::build(&root);
        // ids: 0 root, 1 mid, 2 inner, 3 leaf, 4 mid, 5 inner, 6 leaf
        assert_eq!(StructOrdering::TopLevelFirst.order(&tree), vec![0, 1, 4, 2, 3, 5, 6]);
        assert_eq!(StructOrdering::BreadthFirst.order(&tree), vec![0, 1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("bfs".parse::<StructOrdering>().unwrap(), StructOrdering::BreadthFirst);
        assert_eq!("Depth-First".parse::<StructOrdering>().unwrap(), StructOrdering::DepthFirst);
        assert!("sideways".parse::<StructOrdering>().is_err());
        for ordering in StructOrdering::ALL {
            assert_eq!(ordering.name().parse::<StructOrdering>().unwrap(), ordering);
        }
    }
}
