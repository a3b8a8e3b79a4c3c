use crate::allocator::{AllocPtr, Node, NodeAllocator, EMPTY_ALLOC_PTR};
use crate::TreeKey;

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::mem;

/// Uniquely and stably identifies a node in an [`OrderedTree`] (until the tree is cleared).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodePtr {
    pub(crate) alloc_ptr: AllocPtr,
}

impl NodePtr {
    pub(crate) fn new(alloc_ptr: AllocPtr) -> Self {
        Self { alloc_ptr }
    }
}

/// How a full node is relieved during [`OrderedTree::insert`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SplitPolicy {
    /// Full nodes are split on the way down, before descending into them, so a node never holds more than its maximum.
    ///
    /// Used for even branching factors, whose full nodes have an odd key count and thus a true median.
    PreSplit,
    /// The key is inserted at the leaf first, then overflowing nodes are split bottom-up along the descent path.
    ///
    /// Used for odd branching factors, where pre-splitting a full node would leave one half empty.
    SplitOnOverflow,
}

/// Read-only view of one node.
#[derive(Debug)]
pub struct NodeRef<'a, K, V> {
    ptr: NodePtr,
    node: &'a Node<K, V>,
}

impl<'a, K, V> NodeRef<'a, K, V> {
    #[inline]
    pub fn ptr(&self) -> NodePtr {
        self.ptr
    }

    /// Sorted keys of this node.
    #[inline]
    pub fn keys(&self) -> &'a [K] {
        &self.node.keys
    }

    /// Values in the same order as [`NodeRef::keys`].
    #[inline]
    pub fn values(&self) -> &'a [V] {
        &self.node.values
    }

    /// Empty for leaves.
    #[inline]
    pub fn children(&self) -> impl ExactSizeIterator<Item = NodePtr> + 'a {
        self.node.children.iter().map(|&ptr| NodePtr::new(ptr))
    }

    /// `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodePtr> {
        (self.node.parent != EMPTY_ALLOC_PTR).then(|| NodePtr::new(self.node.parent))
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.node.is_leaf
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VisitCommand {
    Continue,
    SkipDescendants,
}

/// An in-memory ordered map from integer keys to values, stored as a B-tree with branching factor `ORDER`.
///
/// Every node holds at most `ORDER - 1` sorted keys and internal nodes hold one more child than keys. All leaves are at
/// the same depth. The tree starts as a single empty leaf and only grows taller when the root splits.
///
/// Keys are unique: inserting an existing key replaces its value.
///
/// - get: O(log n)
/// - insert: O(log n)
/// - iteration: O(n), ascending key order
#[derive(Clone, Debug)]
pub struct OrderedTree<K, V, const ORDER: usize> {
    nodes: NodeAllocator<K, V>,
    root: AllocPtr,
    len: usize,
    /// Number of levels, 1 for a lone root leaf.
    height: usize,
}

impl<K, V, const ORDER: usize> Default for OrderedTree<K, V, ORDER>
where
    K: TreeKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, const ORDER: usize> OrderedTree<K, V, ORDER>
where
    K: TreeKey,
{
    /// Maximum keys held by any node once [`OrderedTree::insert`] returns.
    pub const MAX_KEYS: usize = ORDER - 1;

    pub const SPLIT_POLICY: SplitPolicy = if ORDER % 2 == 0 {
        SplitPolicy::PreSplit
    } else {
        SplitPolicy::SplitOnOverflow
    };

    /// Creates a tree consisting of a single empty leaf.
    ///
    /// # Panics
    ///
    /// If `ORDER < 3`.
    pub fn new() -> Self {
        assert!(ORDER >= 3, "branching factor must be at least 3, got {}", ORDER);
        let mut nodes = NodeAllocator::default();
        let root = nodes.insert_leaf(EMPTY_ALLOC_PTR);
        Self {
            nodes,
            root,
            len: 0,
            height: 1,
        }
    }

    /// The number of keys in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of levels from the root down to the leaves.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The number of allocated nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn root_ptr(&self) -> NodePtr {
        NodePtr::new(self.root)
    }

    /// Returns a view of the node at `ptr`, or `None` if `ptr` does not belong to this tree.
    #[inline]
    pub fn node(&self, ptr: NodePtr) -> Option<NodeRef<'_, K, V>> {
        self.nodes
            .get_node(ptr.alloc_ptr)
            .map(|node| NodeRef { ptr, node })
    }

    #[inline]
    pub fn root(&self) -> NodeRef<'_, K, V> {
        NodeRef {
            ptr: self.root_ptr(),
            node: self.nodes.node(self.root),
        }
    }

    pub fn get(&self, key: K) -> Option<&V> {
        let mut ptr = self.root;
        loop {
            let node = self.nodes.node(ptr);
            match node.keys.binary_search(&key) {
                Ok(i) => return Some(&node.values[i]),
                Err(_) if node.is_leaf => return None,
                Err(i) => ptr = node.children[i],
            }
        }
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let (ptr, i) = self.locate(key)?;
        Some(&mut self.nodes.node_mut(ptr).values[i])
    }

    #[inline]
    pub fn contains_key(&self, key: K) -> bool {
        self.locate(key).is_some()
    }

    /// Inserts `value` at `key`. Returns the old value if `key` was already present.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match Self::SPLIT_POLICY {
            SplitPolicy::PreSplit => self.insert_pre_split(key, value),
            SplitPolicy::SplitOnOverflow => self.insert_split_on_overflow(key, value),
        }
    }

    /// Drops every entry and node, leaving a single empty leaf.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert_leaf(EMPTY_ALLOC_PTR);
        self.len = 0;
        self.height = 1;
    }

    /// Iterate over all entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            nodes: &self.nodes,
            stack: SmallVec::new(),
            remaining: self.len,
        };
        iter.push_leftmost(self.root);
        iter
    }

    /// Visit the root and all descendants in breadth-first order, along with each node's depth (0 for the root).
    ///
    /// If `visitor` returns [`VisitCommand::SkipDescendants`], descendants of that node will not be visited.
    pub fn visit_nodes_breadth_first(
        &self,
        mut visitor: impl FnMut(NodeRef<'_, K, V>, usize) -> VisitCommand,
    ) {
        let mut queue = VecDeque::new();
        queue.push_back((self.root, 0));
        while let Some((ptr, depth)) = queue.pop_front() {
            let node = self.nodes.node(ptr);
            let command = visitor(
                NodeRef {
                    ptr: NodePtr::new(ptr),
                    node,
                },
                depth,
            );
            if command == VisitCommand::Continue {
                queue.extend(node.children.iter().map(|&child| (child, depth + 1)));
            }
        }
    }

    fn locate(&self, key: K) -> Option<(AllocPtr, usize)> {
        let mut ptr = self.root;
        loop {
            let node = self.nodes.node(ptr);
            match node.keys.binary_search(&key) {
                Ok(i) => return Some((ptr, i)),
                Err(_) if node.is_leaf => return None,
                Err(i) => ptr = node.children[i],
            }
        }
    }

    fn insert_pre_split(&mut self, key: K, value: V) -> Option<V> {
        if self.nodes.node(self.root).keys.len() == Self::MAX_KEYS {
            self.grow_root();
        }

        let mut ptr = self.root;
        loop {
            let node = self.nodes.node_mut(ptr);
            match node.keys.binary_search(&key) {
                Ok(i) => return Some(mem::replace(&mut node.values[i], value)),
                Err(i) if node.is_leaf => {
                    node.keys.insert(i, key);
                    node.values.insert(i, value);
                    self.len += 1;
                    return None;
                }
                Err(mut i) => {
                    let child_ptr = node.children[i];
                    if self.nodes.node(child_ptr).keys.len() == Self::MAX_KEYS {
                        self.split_child(ptr, i);
                        // The child's median now sits at `i` in this node.
                        let node = self.nodes.node_mut(ptr);
                        match key.cmp(&node.keys[i]) {
                            Ordering::Equal => return Some(mem::replace(&mut node.values[i], value)),
                            Ordering::Greater => i += 1,
                            Ordering::Less => {}
                        }
                    }
                    ptr = self.nodes.node(ptr).children[i];
                }
            }
        }
    }

    fn insert_split_on_overflow(&mut self, key: K, value: V) -> Option<V> {
        // (parent, index of the child we descended into)
        let mut path = SmallVec::<[(AllocPtr, usize); 16]>::new();
        let mut ptr = self.root;
        loop {
            let node = self.nodes.node_mut(ptr);
            match node.keys.binary_search(&key) {
                Ok(i) => return Some(mem::replace(&mut node.values[i], value)),
                Err(i) if node.is_leaf => {
                    node.keys.insert(i, key);
                    node.values.insert(i, value);
                    break;
                }
                Err(i) => {
                    path.push((ptr, i));
                    ptr = node.children[i];
                }
            }
        }
        self.len += 1;

        while self.nodes.node(ptr).keys.len() > Self::MAX_KEYS {
            match path.pop() {
                Some((parent_ptr, child_index)) => {
                    self.split_child(parent_ptr, child_index);
                    ptr = parent_ptr;
                }
                None => {
                    self.grow_root();
                    break;
                }
            }
        }
        None
    }

    /// Puts a new, key-less root above the current one and splits the old root into it.
    fn grow_root(&mut self) {
        let old_root = self.root;
        let mut new_root = Node::new(false, EMPTY_ALLOC_PTR);
        new_root.children.push(old_root);
        let new_root = self.nodes.insert(new_root);
        self.nodes.set_parent(old_root, new_root);
        self.root = new_root;
        self.height += 1;
        self.split_child(new_root, 0);
        tracing::debug!(height = self.height, len = self.len, "split tree root");
    }

    /// Moves the upper half of child `child_index` of `parent_ptr` into a new right sibling and promotes the median
    /// entry into the parent, between the two.
    fn split_child(&mut self, parent_ptr: AllocPtr, child_index: usize) {
        let child_ptr = self.nodes.node(parent_ptr).children[child_index];
        let child = self.nodes.node_mut(child_ptr);
        let mid = child.keys.len() / 2;

        let mut sibling = Node::new(child.is_leaf, parent_ptr);
        sibling.keys.extend(child.keys.drain(mid + 1..));
        sibling.values.extend(child.values.drain(mid + 1..));
        if !child.is_leaf {
            sibling.children.extend(child.children.drain(mid + 1..));
        }
        let median_key = child.keys.remove(mid);
        let median_value = child.values.remove(mid);

        let sibling_ptr = self.nodes.insert(sibling);
        let moved = self.nodes.node(sibling_ptr).children.clone();
        for grandchild in moved {
            self.nodes.set_parent(grandchild, sibling_ptr);
        }

        tracing::trace!(?median_key, child_ptr, sibling_ptr, "split tree node");
        let parent = self.nodes.node_mut(parent_ptr);
        parent.keys.insert(child_index, median_key);
        parent.values.insert(child_index, median_value);
        parent.children.insert(child_index + 1, sibling_ptr);
    }

    /// Panics unless every structural invariant holds.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut leaf_depths = Vec::new();
        let mut key_count = 0;
        // (node, expected parent, exclusive lower bound, exclusive upper bound, depth)
        let mut stack = vec![(self.root, EMPTY_ALLOC_PTR, None, None, 0)];
        while let Some((ptr, parent, lower, upper, depth)) = stack.pop() {
            let node = self.nodes.node(ptr);
            assert_eq!(node.parent, parent, "stale parent pointer on node {}", ptr);
            assert!(node.keys.len() <= Self::MAX_KEYS, "node {} overflows", ptr);
            assert_eq!(node.keys.len(), node.values.len());
            if ptr != self.root {
                assert!(!node.keys.is_empty(), "non-root node {} is empty", ptr);
            }
            assert!(node.keys.windows(2).all(|w| w[0] < w[1]), "unsorted node {}", ptr);
            if let (Some(lower), Some(first)) = (lower, node.keys.first()) {
                assert!(lower < *first);
            }
            if let (Some(upper), Some(last)) = (upper, node.keys.last()) {
                assert!(*last < upper);
            }
            key_count += node.keys.len();

            if node.is_leaf {
                assert!(node.children.is_empty());
                leaf_depths.push(depth);
            } else {
                assert_eq!(node.children.len(), node.keys.len() + 1);
                for (i, &child) in node.children.iter().enumerate() {
                    let child_lower = if i == 0 { lower } else { Some(node.keys[i - 1]) };
                    let child_upper = node.keys.get(i).copied().or(upper);
                    stack.push((child, ptr, child_lower, child_upper, depth + 1));
                }
            }
        }
        assert_eq!(key_count, self.len);
        assert!(
            leaf_depths.iter().all(|&d| d + 1 == self.height),
            "unbalanced leaves {:?} for height {}",
            leaf_depths,
            self.height
        );
    }
}

/// Ascending-order iterator over the entries of an [`OrderedTree`].
pub struct Iter<'a, K, V> {
    nodes: &'a NodeAllocator<K, V>,
    /// (node, index of the next key to yield)
    stack: SmallVec<[(AllocPtr, usize); 16]>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_leftmost(&mut self, mut ptr: AllocPtr) {
        loop {
            self.stack.push((ptr, 0));
            let node = self.nodes.node(ptr);
            if node.is_leaf {
                return;
            }
            ptr = node.children[0];
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        loop {
            let (ptr, i) = self.stack.pop()?;
            let node = nodes.node(ptr);
            if i < node.keys.len() {
                self.stack.push((ptr, i + 1));
                if !node.is_leaf {
                    self.push_leftmost(node.children[i + 1]);
                }
                self.remaining -= 1;
                return Some((&node.keys[i], &node.values[i]));
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V, const ORDER: usize> IntoIterator for &'a OrderedTree<K, V, ORDER>
where
    K: TreeKey,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, const ORDER: usize> Extend<(K, V)> for OrderedTree<K, V, ORDER>
where
    K: TreeKey,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, const ORDER: usize> FromIterator<(K, V)> for OrderedTree<K, V, ORDER>
where
    K: TreeKey,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
