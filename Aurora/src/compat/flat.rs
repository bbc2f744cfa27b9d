//! Pre-order flattening of a struct tree
//!
//! Layout strategies work on ids rather than on the nested tree. An id is a
//! struct's position in a depth-first pre-order walk, so the root is always
//! 0 and a struct's descendants are exactly `id + 1..subtree_end`.

use crate::formats::gff::{FieldValue, GffStruct};

/// One struct of a [`FlatTree`].
#[derive(Debug, Clone)]
pub struct FlatStruct<'a> {
    pub node: &'a GffStruct,
    pub parent: Option<usize>,
    /// Child ids in field order, list elements in list order.
    pub children: Vec<usize>,
    pub depth: usize,
    /// Position within the containing list, for list elements.
    pub list_position: Option<usize>,
    /// One past the last id in this struct's subtree.
    pub subtree_end: usize,
}

impl FlatStruct<'_> {
    #[must_use]
    pub fn field_count(&self) -> u32 {
        self.node.fields.len() as u32
    }
}

#[derive(Debug, Clone)]
pub struct FlatTree<'a> {
    structs: Vec<FlatStruct<'a>>,
}

impl<'a> FlatTree<'a> {
    #[must_use]
    pub fn build(root: &'a GffStruct) -> Self {
        let mut tree = Self {
            structs: Vec::with_capacity(root.struct_count()),
        };
        tree.visit(root, None, 0, None);
        tree
    }

    fn visit(
        &mut self,
        node: &'a GffStruct,
        parent: Option<usize>,
        depth: usize,
        list_position: Option<usize>,
    ) -> usize {
        let id = self.structs.len();
        self.structs.push(FlatStruct {
            node,
            parent,
            children: Vec::new(),
            depth,
            list_position,
            subtree_end: id + 1,
        });

        let mut children = Vec::new();
        for field in &node.fields {
            match &field.value {
                FieldValue::Struct(child) => {
                    children.push(self.visit(child, Some(id), depth + 1, None));
                }
                FieldValue::List(items) => {
                    for (position, item) in items.iter().enumerate() {
                        children.push(self.visit(item, Some(id), depth + 1, Some(position)));
                    }
                }
                _ => {}
            }
        }

        let end = self.structs.len();
        let flat = &mut self.structs[id];
        flat.children = children;
        flat.subtree_end = end;
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.structs.len()
    }

    /// Always false: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: usize) -> &FlatStruct<'a> {
        &self.structs[id]
    }

    #[must_use]
    pub fn root(&self) -> &FlatStruct<'a> {
        &self.structs[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlatStruct<'a>> {
        self.structs.iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::formats::gff::GffStruct;

    /// root { A: [a0 { S: s }, a1], B: [b0] }
    pub(crate) fn sample_tree() -> GffStruct {
        let s = GffStruct::new(0).with("X", FieldValue::Byte(1));
        let a0 = GffStruct::new(0).with("S", FieldValue::Struct(Box::new(s)));
        let a1 = GffStruct::new(0).with("X", FieldValue::Byte(2)).with("Y", FieldValue::Byte(3));
        let b0 = GffStruct::new(0);
        GffStruct::root()
            .with("A", FieldValue::List(vec![a0, a1]))
            .with("B", FieldValue::List(vec![b0]))
    }

    #[test]
    fn test_preorder_ids() {
        let root = sample_tree();
        let tree = FlatTree::build(&root);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.root().children, vec![1, 3, 4]);
        assert_eq!(tree.get(1).children, vec![2]);
        assert_eq!(tree.get(1).subtree_end, 3);
        assert_eq!(tree.get(2).list_position, None);
        assert_eq!(tree.get(3).list_position, Some(1));
        assert_eq!(tree.get(4).list_position, Some(0));
        assert_eq!(tree.get(2).depth, 2);
        assert_eq!(tree.get(2).parent, Some(1));
    }
}
