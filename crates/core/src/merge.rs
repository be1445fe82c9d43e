use std::{
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
};

use serde_json::{Map, Value};

/// Accumulates the partial outputs of the context phase.
///
/// The accumulator starts at `Default::default()` and each partial is merged
/// in registration order, so on key collision the later task wins.
pub trait Merge: Default {
    fn merge(&mut self, partial: Self);
}

impl Merge for () {
    fn merge(&mut self, _partial: Self) {}
}

impl<K, V, S> Merge for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}

impl<K, V> Merge for BTreeMap<K, V>
where
    K: Ord,
{
    fn merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}

// Shallow: nested objects are replaced, not merged.
impl Merge for Map<String, Value> {
    fn merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}

pub(crate) fn merge_all<C, P>(partials: P) -> C
where
    C: Merge,
    P: IntoIterator<Item = C>,
{
    partials.into_iter().fold(C::default(), |mut acc, partial| {
        acc.merge(partial);
        acc
    })
}
