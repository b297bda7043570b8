use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Item keys are matched case-insensitively; the stored form is trimmed and lowercased.
pub fn normalize_item(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Item key -> FIFO queue of redemption codes.
///
/// Items keep the order in which they first appeared in the document, so
/// summaries list them in stocking order. Serialized as a plain JSON object
/// (`{"diamond": ["a1", "a2"]}`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<(String, Vec<String>)>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct items (including items with an empty queue).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.position(item).is_some()
    }

    pub fn codes(&self, item: &str) -> Option<&[String]> {
        self.position(item).map(|idx| self.items[idx].1.as_slice())
    }

    /// Current queue length for `item`, or `None` if the item was never stocked.
    pub fn stock_of(&self, item: &str) -> Option<usize> {
        self.codes(item).map(|c| c.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Adds `codes` to the back of the item's queue, creating it if needed.
    /// Returns the new queue length.
    pub fn append(&mut self, item: &str, codes: &[String]) -> usize {
        let queue = self.queue_or_insert(item);
        queue.extend(codes.iter().cloned());
        queue.len()
    }

    /// Removes the first `qty` codes. On error the queue is left untouched.
    pub fn withdraw(&mut self, item: &str, qty: usize) -> Result<Vec<String>, Error> {
        let idx = self
            .position(item)
            .ok_or_else(|| Error::UnknownItem(item.to_string()))?;
        let queue = &mut self.items[idx].1;
        if qty > queue.len() {
            return Err(Error::OutOfStock {
                item: item.to_string(),
                requested: qty,
                available: queue.len(),
            });
        }
        Ok(queue.drain(..qty).collect())
    }

    /// Puts previously withdrawn codes back at the front, in the order given.
    pub fn restore(&mut self, item: &str, codes: &[String]) -> usize {
        let queue = self.queue_or_insert(item);
        queue.splice(0..0, codes.iter().cloned());
        queue.len()
    }

    fn position(&self, item: &str) -> Option<usize> {
        self.items.iter().position(|(k, _)| k == item)
    }

    fn queue_or_insert(&mut self, item: &str) -> &mut Vec<String> {
        let idx = match self.position(item) {
            Some(idx) => idx,
            None => {
                self.items.push((item.to_string(), Vec::new()));
                self.items.len() - 1
            }
        };
        &mut self.items[idx].1
    }
}

impl FromIterator<(String, Vec<String>)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut inv = Inventory::new();
        for (item, codes) in iter {
            *inv.queue_or_insert(&item) = codes;
        }
        inv
    }
}

impl Serialize for Inventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.items.len()))?;
        for (item, codes) in &self.items {
            map.serialize_entry(item, codes)?;
        }
        map.end()
    }
}

struct InventoryVisitor;

impl<'de> Visitor<'de> for InventoryVisitor {
    type Value = Inventory;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping item names to arrays of codes")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Inventory, A::Error> {
        let mut inv = Inventory::new();
        // Later duplicates win, same as deserializing into a HashMap.
        while let Some((item, codes)) = access.next_entry::<String, Vec<String>>()? {
            *inv.queue_or_insert(&item) = codes;
        }
        Ok(inv)
    }
}

impl<'de> Deserialize<'de> for Inventory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(InventoryVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_withdraw_then_restore_is_identity() {
        let mut inv: Inventory =
            vec![("diamond".to_string(), codes(&["c1", "c2", "c3", "c4"]))].into_iter().collect();
        let taken = inv.withdraw("diamond", 2).unwrap();
        assert_eq!(taken, codes(&["c1", "c2"]));
        assert_eq!(inv.codes("diamond").unwrap(), codes(&["c3", "c4"]).as_slice());

        inv.restore("diamond", &taken);
        assert_eq!(inv.codes("diamond").unwrap(), codes(&["c1", "c2", "c3", "c4"]).as_slice());
    }

    #[test]
    fn test_out_of_stock_leaves_queue_alone() {
        let mut inv: Inventory = vec![("gold".to_string(), codes(&["x", "y"]))].into_iter().collect();
        match inv.withdraw("gold", 3) {
            Err(Error::OutOfStock { requested, available, .. }) => {
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected OutOfStock, got {other:?}"),
        }
        assert_eq!(inv.codes("gold").unwrap(), codes(&["x", "y"]).as_slice());
    }

    #[test]
    fn test_unknown_item_does_not_create_entry() {
        let mut inv = Inventory::new();
        assert!(matches!(inv.withdraw("ghost", 1), Err(Error::UnknownItem(_))));
        assert!(!inv.contains("ghost"));
        assert!(inv.is_empty());
    }

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let mut inv = Inventory::new();
        inv.append("gold", &codes(&["a", "b"]));
        let total = inv.append("gold", &codes(&["c", "a"]));
        assert_eq!(total, 4);
        assert_eq!(inv.codes("gold").unwrap(), codes(&["a", "b", "c", "a"]).as_slice());
    }

    #[test]
    fn test_document_keeps_item_order() {
        let raw = r#"{"zeta": ["1"], "alpha": [], "mid": ["2", "3"]}"#;
        let inv: Inventory = serde_json::from_str(raw).unwrap();
        let keys: Vec<&str> = inv.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        let back = serde_json::to_string(&inv).unwrap();
        assert_eq!(back, r#"{"zeta":["1"],"alpha":[],"mid":["2","3"]}"#);
    }

    #[test]
    fn test_normalize_item() {
        assert_eq!(normalize_item("  DiAmond "), "diamond");
    }
}
