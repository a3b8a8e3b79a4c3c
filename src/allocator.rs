use slab::Slab;
use smallvec::SmallVec;

/// Points to a node owned by an internal allocator.
pub type AllocPtr = u32;

/// An [`AllocPtr`] that doesn't point to anything.
pub const EMPTY_ALLOC_PTR: AllocPtr = AllocPtr::MAX;

/// Inline capacity for node keys and values. Covers one transient overflow key for branching factors up to 4.
pub(crate) const INLINE_KEYS: usize = 4;

/// One tree node. Leaves never have children; an internal node with `n` keys has `n + 1` children.
#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) keys: SmallVec<[K; INLINE_KEYS]>,
    pub(crate) values: SmallVec<[V; INLINE_KEYS]>,
    pub(crate) children: SmallVec<[AllocPtr; INLINE_KEYS + 1]>,
    /// Informational back-reference, [`EMPTY_ALLOC_PTR`] for the root.
    pub(crate) parent: AllocPtr,
    pub(crate) is_leaf: bool,
}

impl<K, V> Node<K, V> {
    #[inline]
    pub(crate) fn new(is_leaf: bool, parent: AllocPtr) -> Self {
        Self {
            keys: SmallVec::new(),
            values: SmallVec::new(),
            children: SmallVec::new(),
            parent,
            is_leaf,
        }
    }
}

/// Allocate tree nodes.
///
/// Nodes are only ever created (on split) and released all at once by [`NodeAllocator::clear`].
#[derive(Clone, Debug)]
pub(crate) struct NodeAllocator<K, V> {
    nodes: Slab<Node<K, V>>,
}

impl<K, V> Default for NodeAllocator<K, V> {
    fn default() -> Self {
        Self {
            nodes: Default::default(),
        }
    }
}

impl<K, V> NodeAllocator<K, V> {
    #[inline]
    pub fn insert(&mut self, node: Node<K, V>) -> AllocPtr {
        self.nodes.insert(node) as AllocPtr
    }

    #[inline]
    pub fn insert_leaf(&mut self, parent: AllocPtr) -> AllocPtr {
        self.insert(Node::new(true, parent))
    }

    #[inline]
    pub fn get_node(&self, ptr: AllocPtr) -> Option<&Node<K, V>> {
        self.nodes.get(ptr as usize)
    }

    /// Panics if `ptr` is dangling. Every pointer stored in the tree is live, so this only fails on internal bugs.
    #[inline]
    pub fn node(&self, ptr: AllocPtr) -> &Node<K, V> {
        &self.nodes[ptr as usize]
    }

    #[inline]
    pub fn node_mut(&mut self, ptr: AllocPtr) -> &mut Node<K, V> {
        &mut self.nodes[ptr as usize]
    }

    #[inline]
    pub fn set_parent(&mut self, child_ptr: AllocPtr, parent_ptr: AllocPtr) {
        self.node_mut(child_ptr).parent = parent_ptr;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
