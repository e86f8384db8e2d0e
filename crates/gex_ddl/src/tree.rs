//! Ordered tree stored in an arena.
//!
//! Nodes are addressed by [`NodeId`] and never move. Each node records its
//! parent, first and last child, and previous and next sibling, so splicing
//! is index bookkeeping with no ownership cycles. Detached nodes keep their
//! storage until the whole tree is cleared.

use std::ops::{Index, IndexMut};

/// Stable index of a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Links {
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    links: Links,
    data: T,
}

#[derive(Debug, Clone)]
pub struct Tree<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Add a detached node.
    pub fn add(&mut self, data: T) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot {
            links: Links::default(),
            data,
        });
        id
    }

    /// Number of nodes ever added, detached ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.index()).map(|s| &s.data)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(id.index()).map(|s| &mut s.data)
    }

    fn links(&self, id: NodeId) -> &Links {
        &self.slots[id.index()].links
    }

    fn links_mut(&mut self, id: NodeId) -> &mut Links {
        &mut self.slots[id.index()].links
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).prev_sibling
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.links(parent).last_child;
        {
            let links = self.links_mut(child);
            links.parent = Some(parent);
            links.prev_sibling = last;
        }
        match last {
            Some(last) => self.links_mut(last).next_sibling = Some(child),
            None => self.links_mut(parent).first_child = Some(child),
        }
        self.links_mut(parent).last_child = Some(child);
    }

    /// Insert `child` as the first child of `parent`, detaching it first.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        match self.links(parent).first_child {
            Some(first) => self.insert_before(first, child),
            None => self.append_child(parent, child),
        }
    }

    /// Insert `node` immediately before `sibling` under the same parent.
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) {
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        self.detach(node);
        let prev = self.links(sibling).prev_sibling;
        {
            let links = self.links_mut(node);
            links.parent = Some(parent);
            links.prev_sibling = prev;
            links.next_sibling = Some(sibling);
        }
        self.links_mut(sibling).prev_sibling = Some(node);
        match prev {
            Some(prev) => self.links_mut(prev).next_sibling = Some(node),
            None => self.links_mut(parent).first_child = Some(node),
        }
    }

    /// Insert `node` immediately after `sibling` under the same parent.
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) {
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        self.detach(node);
        let next = self.links(sibling).next_sibling;
        {
            let links = self.links_mut(node);
            links.parent = Some(parent);
            links.prev_sibling = Some(sibling);
            links.next_sibling = next;
        }
        self.links_mut(sibling).next_sibling = Some(node);
        match next {
            Some(next) => self.links_mut(next).prev_sibling = Some(node),
            None => self.links_mut(parent).last_child = Some(node),
        }
    }

    /// Unlink `id` (with its subtree) from its parent and siblings.
    pub fn detach(&mut self, id: NodeId) {
        let Links {
            parent,
            prev_sibling,
            next_sibling,
            ..
        } = *self.links(id);

        let Some(parent) = parent else {
            return;
        };

        match prev_sibling {
            Some(prev) => self.links_mut(prev).next_sibling = next_sibling,
            None => self.links_mut(parent).first_child = next_sibling,
        }
        match next_sibling {
            Some(next) => self.links_mut(next).prev_sibling = prev_sibling,
            None => self.links_mut(parent).last_child = prev_sibling,
        }

        let links = self.links_mut(id);
        links.parent = None;
        links.prev_sibling = None;
        links.next_sibling = None;
    }

    /// Move every child of `from` to the end of `to`, keeping their order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        while let Some(child) = self.first_child(from) {
            self.append_child(to, child);
        }
    }

    pub fn children(&self, id: NodeId) -> Children<'_, T> {
        Children {
            tree: self,
            next: self.first_child(id),
            reverse: false,
        }
    }

    pub fn children_rev(&self, id: NodeId) -> Children<'_, T> {
        Children {
            tree: self,
            next: self.last_child(id),
            reverse: true,
        }
    }

    /// Pre-order walk of the subtree below `id`, not including `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_, T> {
        Descendants {
            tree: self,
            root: id,
            next: self.first_child(id),
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Number of ancestors above `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(node) = current {
            depth += 1;
            current = self.parent(node);
        }
        depth
    }

    /// `true` if `ancestor` lies strictly above `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Next node after `id` in a pre-order walk bounded by `root`.
    fn next_in_subtree(&self, root: NodeId, id: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(id) {
            return Some(child);
        }
        let mut current = id;
        while current != root {
            if let Some(next) = self.next_sibling(current) {
                return Some(next);
            }
            current = self.parent(current)?;
        }
        None
    }
}

impl<T> Index<NodeId> for Tree<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        &self.slots[id.index()].data
    }
}

impl<T> IndexMut<NodeId> for Tree<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.slots[id.index()].data
    }
}

pub struct Children<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
    reverse: bool,
}

impl<T> Iterator for Children<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = if self.reverse {
            self.tree.prev_sibling(current)
        } else {
            self.tree.next_sibling(current)
        };
        Some(current)
    }
}

pub struct Descendants<'a, T> {
    tree: &'a Tree<T>,
    root: NodeId,
    next: Option<NodeId>,
}

impl<T> Iterator for Descendants<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_in_subtree(self.root, current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tree: &Tree<&'static str>, ids: impl Iterator<Item = NodeId>) -> Vec<&'static str> {
        ids.map(|id| tree[id]).collect()
    }

    fn sample() -> (Tree<&'static str>, NodeId, [NodeId; 4]) {
        let mut tree = Tree::new();
        let root = tree.add("root");
        let a = tree.add("a");
        let b = tree.add("b");
        let c = tree.add("c");
        let a1 = tree.add("a1");
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(root, c);
        tree.append_child(a, a1);
        (tree, root, [a, b, c, a1])
    }

    #[test]
    fn test_append_keeps_order() {
        let (tree, root, _) = sample();
        assert_eq!(names(&tree, tree.children(root)), ["a", "b", "c"]);
        assert_eq!(names(&tree, tree.children_rev(root)), ["c", "b", "a"]);
        assert_eq!(tree.child_count(root), 3);
    }

    #[test]
    fn test_descendants_pre_order() {
        let (tree, root, [a, ..]) = sample();
        assert_eq!(names(&tree, tree.descendants(root)), ["a", "a1", "b", "c"]);
        assert_eq!(names(&tree, tree.descendants(a)), ["a1"]);
    }

    #[test]
    fn test_detach_middle() {
        let (mut tree, root, [a, b, c, _]) = sample();
        tree.detach(b);

        assert_eq!(names(&tree, tree.children(root)), ["a", "c"]);
        assert_eq!(tree.next_sibling(a), Some(c));
        assert_eq!(tree.prev_sibling(c), Some(a));
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn test_detach_ends() {
        let (mut tree, root, [a, b, c, _]) = sample();
        tree.detach(a);
        tree.detach(c);

        assert_eq!(tree.first_child(root), Some(b));
        assert_eq!(tree.last_child(root), Some(b));
    }

    #[test]
    fn test_insert_before_and_after() {
        let (mut tree, root, [a, b, c, _]) = sample();
        let x = tree.add("x");
        let y = tree.add("y");
        tree.insert_before(a, x);
        tree.insert_after(c, y);

        assert_eq!(names(&tree, tree.children(root)), ["x", "a", "b", "c", "y"]);

        tree.insert_after(a, c);
        assert_eq!(names(&tree, tree.children(root)), ["x", "a", "c", "b", "y"]);
        assert_eq!(tree.last_child(root), Some(y));
        assert_eq!(tree.prev_sibling(b), Some(c));
    }

    #[test]
    fn test_prepend() {
        let (mut tree, root, _) = sample();
        let z = tree.add("z");
        tree.prepend_child(root, z);
        assert_eq!(tree.first_child(root), Some(z));
    }

    #[test]
    fn test_move_children() {
        let (mut tree, root, [a, ..]) = sample();
        let target = tree.add("target");
        tree.move_children(root, target);

        assert_eq!(tree.child_count(root), 0);
        assert_eq!(names(&tree, tree.children(target)), ["a", "b", "c"]);
        assert_eq!(tree.parent(a), Some(target));
    }

    #[test]
    fn test_depth_and_ancestry() {
        let (tree, root, [a, b, _, a1]) = sample();
        assert_eq!(tree.depth(root), 0);
        assert_eq!(tree.depth(a1), 2);
        assert!(tree.is_ancestor(root, a1));
        assert!(tree.is_ancestor(a, a1));
        assert!(!tree.is_ancestor(b, a1));
        assert!(!tree.is_ancestor(a1, a1));
    }
}
