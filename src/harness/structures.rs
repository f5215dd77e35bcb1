use std::collections::{HashSet, VecDeque};

/// Arena backed binary tree using the level-order convention for
/// serialization: `None` marks a missing child.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinaryTree {
    nodes: Vec<TreeNode>,
    root: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
struct TreeNode {
    val: i64,
    left: Option<usize>,
    right: Option<usize>,
}

impl BinaryTree {
    pub fn from_level_order(values: &[Option<i64>]) -> Self {
        let mut tree = Self::default();
        let Some(Some(first)) = values.first() else {
            return tree;
        };

        tree.root = Some(tree.push(*first));
        let mut queue = VecDeque::from([0usize]);
        let mut idx = 1;

        while idx < values.len() {
            let Some(parent) = queue.pop_front() else {
                break;
            };

            if let Some(Some(val)) = values.get(idx) {
                let child = tree.push(*val);
                tree.nodes[parent].left = Some(child);
                queue.push_back(child);
            }
            idx += 1;

            if let Some(Some(val)) = values.get(idx) {
                let child = tree.push(*val);
                tree.nodes[parent].right = Some(child);
                queue.push_back(child);
            }
            idx += 1;
        }

        tree
    }

    pub fn to_level_order(&self) -> Vec<Option<i64>> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out;
        };

        let mut queue = VecDeque::from([Some(root)]);
        while let Some(slot) = queue.pop_front() {
            match slot {
                Some(idx) => {
                    let node = &self.nodes[idx];
                    out.push(Some(node.val));
                    queue.push_back(node.left);
                    queue.push_back(node.right);
                }
                None => out.push(None),
            }
        }

        while matches!(out.last(), Some(None)) {
            out.pop();
        }
        out
    }

    fn push(&mut self, val: i64) -> usize {
        self.nodes.push(TreeNode {
            val,
            left: None,
            right: None,
        });
        self.nodes.len() - 1
    }
}

/// Singly linked list whose tail may point back into the chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedList {
    values: Vec<i64>,
    next: Vec<Option<usize>>,
}

impl LinkedList {
    pub fn from_values(values: &[i64], cycle_pos: Option<usize>) -> Self {
        let mut next: Vec<Option<usize>> = (0..values.len())
            .map(|i| (i + 1 < values.len()).then_some(i + 1))
            .collect();

        if let (Some(pos), Some(tail)) = (cycle_pos, next.last_mut()) {
            if pos < values.len() {
                *tail = Some(pos);
            }
        }

        Self {
            values: values.to_vec(),
            next,
        }
    }

    /// Walks the chain from the head, stopping at the first revisited node.
    pub fn to_values(&self) -> Vec<i64> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = (!self.values.is_empty()).then_some(0usize);

        while let Some(idx) = cursor {
            if !seen.insert(idx) {
                break;
            }
            out.push(self.values[idx]);
            cursor = self.next[idx];
        }
        out
    }

    pub fn cycle_entry(&self) -> Option<usize> {
        self.next.last().copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::{BinaryTree, LinkedList};

    #[test]
    fn tree_round_trip_keeps_gaps() {
        let input = vec![Some(1), Some(2), Some(3), None, Some(4)];
        let tree = BinaryTree::from_level_order(&input);
        assert_eq!(tree.to_level_order(), input);
    }

    #[test]
    fn tree_trims_trailing_nulls() {
        let tree = BinaryTree::from_level_order(&[Some(1), None]);
        assert_eq!(tree.to_level_order(), vec![Some(1)]);

        let tree = BinaryTree::from_level_order(&[Some(5), None, Some(7), None, None]);
        assert_eq!(tree.to_level_order(), vec![Some(5), None, Some(7)]);
    }

    #[test]
    fn tree_skips_children_of_missing_nodes() {
        let input = vec![Some(1), None, Some(2), Some(3)];
        let tree = BinaryTree::from_level_order(&input);
        assert_eq!(tree.to_level_order(), input);

        let orphaned = BinaryTree::from_level_order(&[Some(1), None, Some(2), None, None, Some(9)]);
        assert_eq!(orphaned.to_level_order(), vec![Some(1), None, Some(2)]);
    }

    #[test]
    fn empty_or_null_root_is_empty_tree() {
        assert!(BinaryTree::from_level_order(&[]).to_level_order().is_empty());
        assert!(BinaryTree::from_level_order(&[None, Some(1)]).to_level_order().is_empty());
        assert!(BinaryTree::default().to_level_order().is_empty());
    }

    #[test]
    fn list_round_trip() {
        let list = LinkedList::from_values(&[1, 2, 3], None);
        assert_eq!(list.to_values(), vec![1, 2, 3]);
        assert_eq!(list.cycle_entry(), None);
    }

    #[test]
    fn cyclic_list_traversal_terminates() {
        let list = LinkedList::from_values(&[3, 2, 0, -4], Some(1));
        assert_eq!(list.cycle_entry(), Some(1));
        assert_eq!(list.to_values(), vec![3, 2, 0, -4]);
    }

    #[test]
    fn out_of_range_cycle_position_is_ignored() {
        let list = LinkedList::from_values(&[1, 2], Some(9));
        assert_eq!(list.cycle_entry(), None);
        assert!(LinkedList::from_values(&[], Some(0)).to_values().is_empty());
    }
}
