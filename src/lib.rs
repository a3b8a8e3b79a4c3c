//! Stable-handle storage for game entity registries.
//!
//! Two independent containers:
//!
//! - [`SlotArray`]: a growable array of payloads addressed by [`SlotIndex`] handles. Removed slots go onto a free-index
//!   pile and are reused before the array grows, so a handle stays valid until its payload is removed and nothing is ever
//!   shifted.
//! - [`OrderedTree`]: a small-fanout B-tree mapping integer keys to values, grown by splitting full nodes and promoting
//!   their median key. [`OrderedTree4`] (branching factor 4, pre-split on descent) is the canonical configuration;
//!   [`OrderedTree3`] is the 2-3 tree variant, which splits on overflow.
//!
//! [`Registries`] bundles one [`NamedRegistry`] per entity kind so engine code can pass its registries around explicitly.
//!
//! # Example
//!
//! ```
//! use entity_store::{OrderedTree4, SlotArray};
//!
//! let mut textures = SlotArray::new();
//! let grass = textures.add("grass.png");
//! let stone = textures.add("stone.png");
//! textures.remove(grass).unwrap();
//! assert_eq!(textures.add("water.png"), grass);
//! assert_eq!(textures[stone], "stone.png");
//!
//! let mut depth_index = OrderedTree4::new();
//! depth_index.insert(10, stone);
//! assert_eq!(depth_index.get(10), Some(&stone));
//! assert_eq!(depth_index.get(11), None);
//! ```
//!
//! # Errors
//!
//! Fetching by handle is fallible ([`SlotError`]) because a missing handle is a caller bug worth reporting, while
//! searching with a predicate returns `Option` because finding nothing is an ordinary outcome. Indexing a
//! [`SlotArray`] with a dead handle panics.
//!
//! # Logging
//!
//! Growth, root splits and slot reuse are reported through [`tracing`]. Install a subscriber to see them.

mod allocator;
mod error;
mod key;
mod registry;
mod slot_array;
mod tree;

#[cfg(test)]
mod proptests;

pub use error::SlotError;
pub use key::*;
pub use registry::*;
pub use slot_array::*;
pub use tree::*;

/// A stable handle into a [`SlotArray`].
pub type SlotIndex = u32;

/// The 2-3 tree: at most 2 keys and 3 children per node.
pub type OrderedTree3<V> = OrderedTree<i32, V, 3>;

/// At most 3 keys and 4 children per node.
pub type OrderedTree4<V> = OrderedTree<i32, V, 4>;

use ahash::AHashMap;

type SmallKeyHashMap<K, V> = AHashMap<K, V>;
