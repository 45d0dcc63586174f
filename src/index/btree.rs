//! BTreeMap-based index structures
//!
//! Indexes use BTreeMap<CompositeKey, Vec<ObjectId>> for deterministic
//! ordering. Identifiers under one key are always sorted ascending.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::ObjectId;
use crate::schema::SortOrder;

/// Index key representing a single field value.
///
/// Ordering is deterministic: Null < Bool < Int < Float < String.
/// Absent fields are indexed as `Null`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    /// Absent or null value
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value (stored as bits for total ordering)
    Float(u64),
    /// String value
    String(String),
}

impl IndexKey {
    /// Create a key from a float
    ///
    /// Uses bit representation for total ordering.
    pub fn from_float(v: f64) -> Self {
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        IndexKey::Float(ordered)
    }

    /// Create a key from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Create a key from a JSON value.
    ///
    /// Lists and mappings are keyed by their canonical JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => IndexKey::Null,
            Value::Bool(b) => IndexKey::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    IndexKey::Int(i)
                } else {
                    IndexKey::from_float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => IndexKey::from_string(s.as_str()),
            Value::Array(_) | Value::Object(_) => IndexKey::String(value.to_string()),
        }
    }

    /// Create a key from an optional field value, `Null` when absent
    pub fn from_field(value: Option<&Value>) -> Self {
        value.map_or(IndexKey::Null, IndexKey::from_json)
    }
}

/// One component of a compound key, carrying its sort direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPart {
    pub key: IndexKey,
    pub order: SortOrder,
}

impl KeyPart {
    pub fn new(key: IndexKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    pub fn ascending(key: IndexKey) -> Self {
        Self::new(key, SortOrder::Ascending)
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        let ord = self.key.cmp(&other.key);
        match self.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Key of a (possibly compound) index entry, in index field order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(pub Vec<KeyPart>);

impl CompositeKey {
    /// Returns whether `prefix` matches the leading parts of this key
    pub fn starts_with(&self, prefix: &[KeyPart]) -> bool {
        self.0.len() >= prefix.len()
            && self.0.iter().zip(prefix).all(|(part, wanted)| part.key == wanted.key)
    }

    /// Renders the key values for error messages, e.g. `("p1", "abc123")`
    pub fn render(&self) -> String {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|part| match &part.key {
                IndexKey::Null => "null".to_string(),
                IndexKey::Bool(b) => b.to_string(),
                IndexKey::Int(i) => i.to_string(),
                IndexKey::Float(bits) => format!("float:{:#x}", bits),
                IndexKey::String(s) => format!("{:?}", s),
            })
            .collect();
        format!("({})", parts.join(", "))
    }
}

/// A single index using BTreeMap for deterministic ordering.
#[derive(Debug, Default)]
pub struct IndexTree {
    /// Maps keys to sorted lists of document identifiers
    tree: BTreeMap<CompositeKey, Vec<ObjectId>>,
}

impl IndexTree {
    /// Creates a new empty index tree
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Insert an identifier for a key.
    ///
    /// Maintains sorted ascending order.
    pub fn insert(&mut self, key: CompositeKey, id: ObjectId) {
        let ids = self.tree.entry(key).or_default();
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
        }
    }

    /// Remove an identifier for a key.
    ///
    /// If the key has no more identifiers, removes the key entirely.
    pub fn remove(&mut self, key: &CompositeKey, id: ObjectId) {
        if let Some(ids) = self.tree.get_mut(key) {
            if let Ok(pos) = ids.binary_search(&id) {
                ids.remove(pos);
            }
            if ids.is_empty() {
                self.tree.remove(key);
            }
        }
    }

    /// Lookup all identifiers for an exact key match.
    pub fn lookup_eq(&self, key: &CompositeKey) -> &[ObjectId] {
        self.tree.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Lookup all identifiers whose key starts with `prefix`.
    ///
    /// Returns identifiers in index order: by the remaining key components
    /// (honouring their sort direction), then by identifier.
    pub fn lookup_prefix(&self, prefix: &[KeyPart]) -> Vec<ObjectId> {
        let start = CompositeKey(prefix.to_vec());
        self.tree
            .range(start..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns the total number of identifiers
    pub fn entry_count(&self) -> usize {
        self.tree.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(values: &[(&str, SortOrder)]) -> CompositeKey {
        CompositeKey(
            values
                .iter()
                .map(|(v, order)| KeyPart::new(IndexKey::from_string(*v), *order))
                .collect(),
        )
    }

    #[test]
    fn test_key_ordering() {
        let keys = vec![
            IndexKey::Null,
            IndexKey::Bool(false),
            IndexKey::Bool(true),
            IndexKey::Int(-100),
            IndexKey::Int(0),
            IndexKey::Int(100),
            IndexKey::from_float(-1.5),
            IndexKey::from_float(2.5),
            IndexKey::from_string("aaa"),
            IndexKey::from_string("zzz"),
        ];

        for i in 1..keys.len() {
            assert!(keys[i - 1] < keys[i], "keys should be ordered at {}", i);
        }
    }

    #[test]
    fn test_from_json() {
        assert_eq!(IndexKey::from_json(&json!(null)), IndexKey::Null);
        assert_eq!(IndexKey::from_json(&json!(7)), IndexKey::Int(7));
        assert_eq!(IndexKey::from_json(&json!("x")), IndexKey::from_string("x"));
        assert_eq!(IndexKey::from_field(None), IndexKey::Null);
    }

    #[test]
    fn test_descending_part_reverses() {
        let a = KeyPart::new(IndexKey::Int(1), SortOrder::Descending);
        let b = KeyPart::new(IndexKey::Int(2), SortOrder::Descending);
        assert!(b < a);

        let a = KeyPart::ascending(IndexKey::Int(1));
        let b = KeyPart::ascending(IndexKey::Int(2));
        assert!(a < b);
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut tree = IndexTree::new();
        let (a, b) = (ObjectId::new(), ObjectId::new());
        let k = key(&[("alice", SortOrder::Ascending)]);

        tree.insert(k.clone(), a);
        tree.insert(k.clone(), b);
        tree.insert(k.clone(), a);

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(tree.lookup_eq(&k), expected.as_slice());
        assert_eq!(tree.entry_count(), 2);
    }

    #[test]
    fn test_remove_drops_empty_key() {
        let mut tree = IndexTree::new();
        let id = ObjectId::new();
        let k = key(&[("alice", SortOrder::Ascending)]);
        tree.insert(k.clone(), id);
        tree.remove(&k, id);
        assert!(tree.lookup_eq(&k).is_empty());
        assert!(tree.tree.is_empty());
    }

    #[test]
    fn test_prefix_lookup_honours_descending_component() {
        let mut tree = IndexTree::new();
        let (old, mid, new, other) = (ObjectId::new(), ObjectId::new(), ObjectId::new(), ObjectId::new());
        let entry = |issue: &str, at: i64| {
            CompositeKey(vec![
                KeyPart::ascending(IndexKey::from_string(issue)),
                KeyPart::new(IndexKey::Int(at), SortOrder::Descending),
            ])
        };

        tree.insert(entry("i1", 100), old);
        tree.insert(entry("i1", 300), new);
        tree.insert(entry("i1", 200), mid);
        tree.insert(entry("i2", 400), other);

        let prefix = [KeyPart::ascending(IndexKey::from_string("i1"))];
        assert_eq!(tree.lookup_prefix(&prefix), vec![new, mid, old]);
    }

    #[test]
    fn test_prefix_lookup_stops_at_prefix_end() {
        let mut tree = IndexTree::new();
        let (a, b) = (ObjectId::new(), ObjectId::new());
        tree.insert(key(&[("p1", SortOrder::Ascending)]), a);
        tree.insert(key(&[("p2", SortOrder::Ascending)]), b);

        let prefix = [KeyPart::ascending(IndexKey::from_string("p1"))];
        assert_eq!(tree.lookup_prefix(&prefix), vec![a]);

        let missing = [KeyPart::ascending(IndexKey::from_string("p0"))];
        assert!(tree.lookup_prefix(&missing).is_empty());
    }

    #[test]
    fn test_render() {
        let k = CompositeKey(vec![
            KeyPart::ascending(IndexKey::from_string("p1")),
            KeyPart::ascending(IndexKey::Null),
            KeyPart::ascending(IndexKey::Int(3)),
        ]);
        assert_eq!(k.render(), "(\"p1\", null, 3)");
    }
}
