#![cfg(test)]

// Property tests for RobinHoodMap: the same state machine as the
// sentinel-free engine, plus the slot-consistency invariant checked
// after every operation.

use crate::robin_hood_map::RobinHoodMap;
use crate::strategy::KeyStrategy;
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, u32),
    Remove(usize),
    Get(usize),
    Contains(usize),
    RemoveBelow(u64),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u64>, Vec<OpI>)> {
    proptest::collection::vec(0u64..32, 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            idx.clone().prop_map(OpI::Contains),
            (0u64..32).prop_map(OpI::RemoveBelow),
            Just(OpI::Clear),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Slot consistency: every occupied slot's recorded origin equals the
// rehashed ideal slot of the key stored there.
fn assert_slot_consistency<S>(map: &RobinHoodMap<u64, u32, S>)
where
    S: KeyStrategy<u64>,
{
    for slot in 0..map.capacity() {
        if let Some(origin) = map.slot_origin(slot) {
            let key = map.stored_key(slot).expect("occupied slot has a key");
            assert_eq!(origin, map.ideal_slot(&key), "slot {} origin", slot);
        }
    }
}

fn run_state_machine<S>(pool: Vec<u64>, ops: Vec<OpI>, mut sut: RobinHoodMap<u64, u32, S>)
where
    S: KeyStrategy<u64>,
{
    let mut model: HashMap<u64, u32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i];
                assert_eq!(sut.insert(k, v), model.insert(k, v).is_none());
            }
            OpI::Remove(i) => {
                let k = pool[i];
                let removed = sut.remove(k);
                assert_eq!(removed, model.remove(&k).unwrap_or_default());
            }
            OpI::Get(i) => {
                let k = pool[i];
                assert_eq!(sut.get(k), model.get(&k).copied().unwrap_or_default());
                if let Some(&v) = model.get(&k) {
                    assert_eq!(sut.lkey(), k);
                    assert_eq!(sut.lget(), v);
                }
            }
            OpI::Contains(i) => {
                let k = pool[i];
                assert_eq!(sut.contains(k), model.contains_key(&k));
            }
            OpI::RemoveBelow(t) => {
                let removed = sut.remove_all(|k, _| k < t);
                let before = model.len();
                model.retain(|&k, _| k >= t);
                assert_eq!(removed, before - model.len());
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
            OpI::Iterate => {
                let mut seen: Vec<(u64, u32)> = sut.iter().collect();
                seen.sort_unstable();
                let mut expected: Vec<(u64, u32)> = model.iter().map(|(&k, &v)| (k, v)).collect();
                expected.sort_unstable();
                assert_eq!(seen, expected);
                assert_eq!(sut.iterator_pool().borrowed(), 0);
            }
        }

        assert_slot_consistency(&sut);
        assert_eq!(sut.len(), model.len());
        for (&k, &v) in &model {
            assert!(sut.contains(k));
            assert_eq!(sut.lget(), v);
        }
    }
}

// Property: state-machine equivalence against std::collections::HashMap
// with the slot-consistency invariant re-established after every single
// operation (insert displacement, removal shift, growth rehash, clear).
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(pool, ops, RobinHoodMap::new());
    }
}

// Collision variant: a constant-hash strategy makes every insertion a
// maximal-displacement event, stressing the swap and shift paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Colliding;

impl KeyStrategy<u64> for Colliding {
    fn hash(&self, _key: &u64) -> u64 {
        0
    }
    fn equals(&self, a: &u64, b: &u64) -> bool {
        a == b
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(
            pool,
            ops,
            RobinHoodMap::with_capacity_and_strategy(16, 0.75, Colliding),
        );
    }
}
