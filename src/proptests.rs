use super::*;

use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
enum SlotOp {
    Add(u16),
    Remove(u16),
    Pop(u16),
    FindAndPop(u16),
}

fn slot_op() -> impl Strategy<Value = SlotOp> {
    prop_oneof![
        3 => any::<u16>().prop_map(SlotOp::Add),
        1 => any::<u16>().prop_map(SlotOp::Remove),
        1 => any::<u16>().prop_map(SlotOp::Pop),
        1 => any::<u16>().prop_map(SlotOp::FindAndPop),
    ]
}

/// Picks one of the live handles, or a handle that was never issued.
fn pick_handle(live: &HashMap<SlotIndex, u16>, selector: u16) -> SlotIndex {
    if live.is_empty() || selector % 5 == 0 {
        return 10_000 + selector as SlotIndex;
    }
    let mut handles: Vec<_> = live.keys().copied().collect();
    handles.sort_unstable();
    handles[selector as usize % handles.len()]
}

fn validate_slot_array(array: &SlotArray<u16>, model: &HashMap<SlotIndex, u16>) {
    assert_eq!(array.len(), model.len());
    let mut found = 0;
    for (index, payload) in array.iter() {
        assert_eq!(model.get(&index), Some(payload), "stray payload at {}", index);
        found += 1;
    }
    assert_eq!(found, model.len());
    for (&index, payload) in model {
        assert_eq!(array.get(index), Ok(payload));
    }
}

fn validate_tree<const ORDER: usize>(tree: &OrderedTree<i32, u32, ORDER>, model: &BTreeMap<i32, u32>) {
    tree.assert_invariants();
    assert_eq!(tree.len(), model.len());
    assert!(tree.iter().map(|(&k, &v)| (k, v)).eq(model.iter().map(|(&k, &v)| (k, v))));
}

proptest! {
    #[test]
    fn slot_array_matches_model(ops in prop::collection::vec(slot_op(), 0..400)) {
        let mut array = SlotArray::with_config(SlotArrayConfig::default().with_initial_capacity(8));
        let mut model: HashMap<SlotIndex, u16> = HashMap::new();

        for op in ops {
            match op {
                SlotOp::Add(value) => {
                    let index = array.add(value);
                    prop_assert!(!model.contains_key(&index), "handle {} issued twice", index);
                    prop_assert_eq!(array.get(index), Ok(&value));
                    model.insert(index, value);
                }
                SlotOp::Remove(selector) => {
                    let index = pick_handle(&model, selector);
                    let expected = model.remove(&index);
                    prop_assert_eq!(array.remove(index).is_ok(), expected.is_some());
                    prop_assert!(array.get(index).is_err());
                }
                SlotOp::Pop(selector) => {
                    let index = pick_handle(&model, selector);
                    let expected = model.remove(&index);
                    prop_assert_eq!(array.pop(index).ok(), expected);
                }
                SlotOp::FindAndPop(threshold) => {
                    let expected = model
                        .iter()
                        .filter(|(_, &v)| v >= threshold)
                        .min_by_key(|(&i, _)| i)
                        .map(|(&i, &v)| (i, v));
                    let popped = array.find_and_pop(|&v| v >= threshold);
                    prop_assert_eq!(popped, expected.map(|(_, v)| v));
                    if let Some((index, _)) = expected {
                        model.remove(&index);
                    }
                }
            }
            prop_assert!(array.free_count() + array.len() <= array.capacity());
        }
        validate_slot_array(&array, &model);
    }

    #[test]
    fn reused_handles_come_from_freed_slots(count in 1usize..300, removed in prop::collection::vec(any::<prop::sample::Index>(), 0..50)) {
        let mut array = SlotArray::with_config(SlotArrayConfig::default().with_initial_capacity(16));
        let handles: Vec<_> = (0..count).map(|i| array.add(i)).collect();
        prop_assert_eq!(&handles, &(0..count as SlotIndex).collect::<Vec<_>>());

        let mut freed = Vec::new();
        for selector in removed {
            let index = handles[selector.index(count)];
            if array.remove(index).is_ok() {
                freed.push(index);
            }
        }
        let capacity = array.capacity();

        // Freed handles come back most recent first, without growth.
        for &expected in freed.iter().rev() {
            prop_assert_eq!(array.add(usize::MAX), expected);
        }
        prop_assert_eq!(array.capacity(), capacity);
        prop_assert_eq!(array.add(usize::MAX), count as SlotIndex);
    }

    #[test]
    fn find_returns_lowest_match(values in prop::collection::vec(0u8..8, 1..100), needle in 0u8..8) {
        let mut array = SlotArray::new();
        for &v in &values {
            array.add(v);
        }

        let expected = values.iter().position(|&v| v == needle).map(|i| i as SlotIndex);
        prop_assert_eq!(array.find_index(|&v| v == needle), expected);
        prop_assert_eq!(array.find(|&v| v == needle).is_some(), expected.is_some());
    }

    #[test]
    fn order_three_tree_matches_model(entries in prop::collection::vec((-500i32..500, any::<u32>()), 0..300)) {
        let mut tree = OrderedTree3::new();
        let mut model = BTreeMap::new();
        for (key, value) in entries {
            prop_assert_eq!(tree.insert(key, value), model.insert(key, value));
        }
        validate_tree(&tree, &model);
        for key in -510..510 {
            prop_assert_eq!(tree.get(key), model.get(&key));
        }
    }

    #[test]
    fn order_four_tree_matches_model(entries in prop::collection::vec((-500i32..500, any::<u32>()), 0..300)) {
        let mut tree = OrderedTree4::new();
        let mut model = BTreeMap::new();
        for (key, value) in entries {
            prop_assert_eq!(tree.insert(key, value), model.insert(key, value));
            tree.assert_invariants();
        }
        validate_tree(&tree, &model);
        for key in -510..510 {
            prop_assert_eq!(tree.get(key), model.get(&key));
        }
    }
}

#[test]
fn seeded_random_inserts_stay_balanced() {
    let mut rng = StdRng::seed_from_u64(0x5107);
    let mut tree = OrderedTree::<i32, u32, 5>::new();
    let mut model = BTreeMap::new();
    for i in 0..5_000u32 {
        let key = rng.gen_range(-20_000..20_000);
        assert_eq!(tree.insert(key, i), model.insert(key, i));
    }
    validate_tree(&tree, &model);
    // Minimum fill of a B-tree bounds the height logarithmically.
    assert!(tree.height() <= 12, "height {}", tree.height());
}

#[test]
fn sequential_inserts_keep_every_key() {
    for n in 1..=64 {
        let tree: OrderedTree3<u32> = (0..n).map(|k| (k as i32, k)).collect();
        let model: BTreeMap<i32, u32> = (0..n).map(|k| (k as i32, k)).collect();
        validate_tree(&tree, &model);
    }
}
