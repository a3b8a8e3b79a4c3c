use std::fmt::Debug;

/// An integer key that can be used in an [`OrderedTree`](crate::OrderedTree).
pub trait TreeKey: Sized + Copy + Ord + Debug {}

macro_rules! impl_tree_key {
    ($($t:ty),*) => {
        $(impl TreeKey for $t {})*
    };
}

impl_tree_key!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
