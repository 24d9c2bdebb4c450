//! Result containers (aggregation variants)
//!
//! A [`Ledger`] is the `partial_result` of a call. It also owns the
//! default-wrap rule: how a plain member value becomes an entry.
//!
//! - `Vec<T>`: list accumulation, every value is appended
//! - [`MapLedger`]: key/value accumulation, first writer wins

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;
use tracing::trace;

use crate::error::CouncilError;

/// Accumulated result of a council call
pub trait Ledger: Default {
    /// Plain value a member may return
    type Value;
    /// Element stored by Append/Extend and matched by RemoveResult
    type Entry: fmt::Debug;
    /// What the call finally returns
    type Output;

    /// Default-wrap: turn a plain value into an entry
    fn admit(value: Self::Value) -> Result<Self::Entry, CouncilError>;

    fn record(&mut self, entry: Self::Entry);

    /// Remove one entry equal to `entry`. Returns `false` if none matched.
    fn retract(&mut self, entry: &Self::Entry) -> bool;

    /// Remove the entry at `position` (must be `< len()`)
    fn remove_at(&mut self, position: usize);

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn finish(self) -> Self::Output;
}

impl<T> Ledger for Vec<T>
where
    T: PartialEq + fmt::Debug,
{
    type Value = T;
    type Entry = T;
    type Output = Vec<T>;

    fn admit(value: T) -> Result<T, CouncilError> {
        Ok(value)
    }

    fn record(&mut self, entry: T) {
        self.push(entry);
    }

    fn retract(&mut self, entry: &T) -> bool {
        match self.iter().position(|e| e == entry) {
            Some(pos) => {
                self.remove(pos);
                true
            }
            None => false,
        }
    }

    fn remove_at(&mut self, position: usize) {
        self.remove(position);
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn finish(self) -> Vec<T> {
        self
    }
}

/// Conversion of a plain map-council outcome into a key/value pair.
///
/// Returns `None` for anything that is not exactly one pair.
pub trait IntoPair<K, V> {
    fn into_pair(self) -> Option<(K, V)>;
}

impl<K, V> IntoPair<K, V> for (K, V) {
    fn into_pair(self) -> Option<(K, V)> {
        Some(self)
    }
}

impl<T> IntoPair<T, T> for Vec<T> {
    fn into_pair(self) -> Option<(T, T)> {
        if self.len() != 2 {
            return None;
        }
        let mut items = self.into_iter();
        Some((items.next()?, items.next()?))
    }
}

/// `["key", value]` → `("key", value)`
impl IntoPair<String, Value> for Value {
    fn into_pair(self) -> Option<(String, Value)> {
        match self {
            Value::Array(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                match (items.next()?, items.next()?) {
                    (Value::String(key), value) => Some((key, value)),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Key/value accumulation where the first writer of a key wins.
///
/// Later proposals for an already-set key are ignored. `P` is the plain
/// outcome type members return; it must convert into a `(K, V)` pair.
/// Positional operations (PopResult) address entries in ascending key order.
pub struct MapLedger<K, V, P = (K, V)> {
    entries: BTreeMap<K, V>,
    _plain: PhantomData<fn() -> P>,
}

impl<K: Ord, V, P> MapLedger<K, V, P> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            _plain: PhantomData,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }
}

impl<K: Ord, V, P> Default for MapLedger<K, V, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, P> fmt::Debug for MapLedger<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K, V, P> Ledger for MapLedger<K, V, P>
where
    K: Ord + Clone + fmt::Debug,
    V: PartialEq + fmt::Debug,
    P: IntoPair<K, V>,
{
    type Value = P;
    type Entry = (K, V);
    type Output = BTreeMap<K, V>;

    fn admit(value: P) -> Result<(K, V), CouncilError> {
        value
            .into_pair()
            .ok_or_else(|| CouncilError::contract("malformed key/value outcome"))
    }

    fn record(&mut self, (key, value): (K, V)) {
        if self.entries.contains_key(&key) {
            trace!(?key, "key already set, ignoring later write");
            return;
        }
        self.entries.insert(key, value);
    }

    fn retract(&mut self, (key, value): &(K, V)) -> bool {
        if self.entries.get(key) == Some(value) {
            self.entries.remove(key);
            true
        } else {
            false
        }
    }

    fn remove_at(&mut self, position: usize) {
        if let Some(key) = self.entries.keys().nth(position).cloned() {
            self.entries.remove(&key);
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn finish(self) -> BTreeMap<K, V> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Pairs = MapLedger<String, i32>;

    #[test]
    fn vec_retract_removes_first_match_only() {
        let mut ledger = vec!["a", "b", "a"];
        assert!(ledger.retract(&"a"));
        assert_eq!(ledger, vec!["b", "a"]);
        assert!(!ledger.retract(&"z"));
    }

    #[test]
    fn map_first_writer_wins() {
        let mut ledger = Pairs::new();
        ledger.record(("a".into(), 1));
        ledger.record(("a".into(), 2));
        ledger.record(("b".into(), 3));
        assert_eq!(ledger.get(&"a".to_string()), Some(&1));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn map_retract_needs_matching_value() {
        let mut ledger = Pairs::new();
        ledger.record(("a".into(), 1));
        assert!(!ledger.retract(&("a".into(), 2)));
        assert!(ledger.retract(&("a".into(), 1)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn map_remove_at_uses_key_order() {
        let mut ledger = Pairs::new();
        ledger.record(("c".into(), 3));
        ledger.record(("a".into(), 1));
        ledger.record(("b".into(), 2));
        ledger.remove_at(0);
        assert!(!ledger.contains_key(&"a".to_string()));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn json_pairs_admitted() {
        type JsonMap = MapLedger<String, Value, Value>;
        let entry = JsonMap::admit(json!(["a", 1])).unwrap();
        assert_eq!(entry, ("a".to_string(), json!(1)));
    }

    #[test]
    fn malformed_json_outcome_rejected() {
        type JsonMap = MapLedger<String, Value, Value>;
        for bad in [json!(["a", 1, 2]), json!([1, 2]), json!({"a": 1}), json!("a")] {
            let err = JsonMap::admit(bad).unwrap_err();
            assert!(err.to_string().contains("malformed key/value outcome"));
        }
    }

    #[test]
    fn vec_pair_length_checked() {
        type Same = MapLedger<i32, i32, Vec<i32>>;
        assert_eq!(Same::admit(vec![1, 2]).unwrap(), (1, 2));
        assert!(Same::admit(vec![1]).is_err());
        assert!(Same::admit(vec![1, 2, 3]).is_err());
    }
}
