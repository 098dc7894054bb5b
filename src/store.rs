//! Persistence boundary: the records the app keeps and the store interface it implements.

use std::convert::Infallible;

use chrono::{DateTime, Utc};

use crate::{
    parse_canonical, BonusSlot, EntitlementState, FormatOptions, GeneratedUuid, ParseError,
    UuidVersion,
};

/// A saved UUID.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredUuidRecord {
    pub id: String,

    /// The canonical lowercase hyphenated value; unique across the store.
    pub raw_value: String,
    pub version: UuidVersion,
    pub created_at: DateTime<Utc>,
    pub label: Option<String>,
    pub namespace: Option<String>,
    pub name: Option<String>,

    /// The options the value was displayed with when saved.
    pub format_options: FormatOptions,
}

impl StoredUuidRecord {
    /// Renders the value with the options stored alongside it.
    pub fn formatted_value(&self) -> Result<String, ParseError> {
        parse_canonical(&self.raw_value).map(|uuid| self.format_options.apply(&uuid))
    }
}

impl GeneratedUuid {
    /// Builds the record to persist, keyed by the canonical value.
    ///
    /// A blank `label` is dropped.
    pub fn to_record(
        &self,
        label: Option<&str>,
        format_options: FormatOptions,
    ) -> StoredUuidRecord {
        let raw_value = String::from(self.value);
        StoredUuidRecord {
            id: raw_value.clone(),
            raw_value,
            version: self.version,
            created_at: self.created_at,
            label: label
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            namespace: self.namespace.map(String::from),
            name: self.name.clone(),
            format_options,
        }
    }
}

/// The record store the surrounding app provides.
///
/// Implementations are expected to serialize writes. The quota rules never hold on to anything
/// read from here; callers read fresh snapshots before each decision.
pub trait RecordStore {
    /// The failure type of the underlying storage.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lists saved records, newest first.
    fn list_items(&self) -> Result<Vec<StoredUuidRecord>, Self::Error>;

    fn count_items(&self) -> Result<usize, Self::Error>;

    /// Returns `true` if a record with canonical value `raw_value` exists.
    fn exists_by_value(&self, raw_value: &str) -> Result<bool, Self::Error>;

    fn insert_item(&mut self, record: StoredUuidRecord) -> Result<(), Self::Error>;

    fn delete_item(&mut self, id: &str) -> Result<(), Self::Error>;

    fn clear_items(&mut self) -> Result<(), Self::Error>;

    fn list_bonus_slots(&self) -> Result<Vec<BonusSlot>, Self::Error>;

    fn insert_bonus_slot(&mut self, slot: BonusSlot) -> Result<(), Self::Error>;

    /// Deletes every slot whose expiry is at or before `timestamp`, returning how many went.
    fn delete_bonus_slots_expired_before(
        &mut self,
        timestamp: DateTime<Utc>,
    ) -> Result<usize, Self::Error>;

    /// Returns the entitlement record, or `None` if none was ever written.
    fn get_entitlement(&self) -> Result<Option<EntitlementState>, Self::Error>;

    fn upsert_entitlement(&mut self, state: EntitlementState) -> Result<(), Self::Error>;
}

/// An in-memory [`RecordStore`] for tests, demos, and hosts without persistence.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    items: Vec<StoredUuidRecord>,
    bonus_slots: Vec<BonusSlot>,
    entitlement: Option<EntitlementState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    type Error = Infallible;

    fn list_items(&self) -> Result<Vec<StoredUuidRecord>, Self::Error> {
        let mut items = self.items.clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    fn count_items(&self) -> Result<usize, Self::Error> {
        Ok(self.items.len())
    }

    fn exists_by_value(&self, raw_value: &str) -> Result<bool, Self::Error> {
        Ok(self.items.iter().any(|e| e.raw_value == raw_value))
    }

    /// Inserts `record`, replacing any record with the same id.
    fn insert_item(&mut self, record: StoredUuidRecord) -> Result<(), Self::Error> {
        self.items.retain(|e| e.id != record.id);
        self.items.push(record);
        Ok(())
    }

    fn delete_item(&mut self, id: &str) -> Result<(), Self::Error> {
        self.items.retain(|e| e.id != id);
        Ok(())
    }

    fn clear_items(&mut self) -> Result<(), Self::Error> {
        self.items.clear();
        Ok(())
    }

    fn list_bonus_slots(&self) -> Result<Vec<BonusSlot>, Self::Error> {
        let mut slots = self.bonus_slots.clone();
        slots.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));
        Ok(slots)
    }

    fn insert_bonus_slot(&mut self, slot: BonusSlot) -> Result<(), Self::Error> {
        self.bonus_slots.retain(|e| e.id != slot.id);
        self.bonus_slots.push(slot);
        Ok(())
    }

    fn delete_bonus_slots_expired_before(
        &mut self,
        timestamp: DateTime<Utc>,
    ) -> Result<usize, Self::Error> {
        let before = self.bonus_slots.len();
        self.bonus_slots.retain(|e| !e.is_expired(timestamp));
        Ok(before - self.bonus_slots.len())
    }

    fn get_entitlement(&self) -> Result<Option<EntitlementState>, Self::Error> {
        Ok(self.entitlement.clone())
    }

    fn upsert_entitlement(&mut self, state: EntitlementState) -> Result<(), Self::Error> {
        self.entitlement = Some(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::{MemoryStore, RecordStore};
    use crate::{uuid5, BonusSlot, FormatOption, FormatOptions, GeneratedUuid, UuidVersion};

    fn at(unix_ts_ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(unix_ts_ms).unwrap()
    }

    fn generated(name: &str, created_at: DateTime<Utc>) -> GeneratedUuid {
        let namespace = "6ba7b810-9dad-11d1-80b4-00c04fd430c8".parse().unwrap();
        GeneratedUuid {
            value: uuid5(&namespace, name),
            version: UuidVersion::V5,
            created_at,
            namespace: Some(namespace),
            name: Some(name.to_owned()),
        }
    }

    /// Builds records keyed by canonical value
    #[test]
    fn builds_records_keyed_by_canonical_value() {
        let options = FormatOptions::DEFAULT | FormatOption::Uppercase;
        let record = generated("example", at(1)).to_record(Some("  docs "), options);
        assert_eq!(record.id, "7cb48787-6d91-5b9f-bc60-f30298ea5736");
        assert_eq!(record.raw_value, record.id);
        assert_eq!(record.label.as_deref(), Some("docs"));
        assert_eq!(
            record.namespace.as_deref(),
            Some("6ba7b810-9dad-11d1-80b4-00c04fd430c8")
        );
        assert_eq!(record.name.as_deref(), Some("example"));
        assert_eq!(record.format_options.bits(), 0b011);
        assert_eq!(
            record.formatted_value().as_deref(),
            Ok("7CB48787-6D91-5B9F-BC60-F30298EA5736")
        );

        let record = generated("example", at(1)).to_record(Some(" "), options);
        assert_eq!(record.label, None);
    }

    /// Lists items newest first
    #[test]
    fn lists_items_newest_first() {
        let mut store = MemoryStore::new();
        for (name, ts) in [("a", 2), ("b", 3), ("c", 1)] {
            let record = generated(name, at(ts)).to_record(None, FormatOptions::DEFAULT);
            store.insert_item(record).unwrap();
        }
        let names: Vec<_> = store
            .list_items()
            .unwrap()
            .into_iter()
            .filter_map(|e| e.name)
            .collect();
        assert_eq!(names, ["b", "a", "c"]);
        assert_eq!(store.count_items().unwrap(), 3);
    }

    /// Finds, deletes, and clears items
    #[test]
    fn finds_deletes_and_clears_items() {
        let mut store = MemoryStore::new();
        let a = generated("a", at(1)).to_record(None, FormatOptions::DEFAULT);
        let b = generated("b", at(2)).to_record(None, FormatOptions::DEFAULT);
        store.insert_item(a.clone()).unwrap();
        store.insert_item(b.clone()).unwrap();

        assert!(store.exists_by_value(&a.raw_value).unwrap());
        store.delete_item(&a.id).unwrap();
        assert!(!store.exists_by_value(&a.raw_value).unwrap());
        assert_eq!(store.count_items().unwrap(), 1);

        store.clear_items().unwrap();
        assert_eq!(store.count_items().unwrap(), 0);
        assert!(!store.exists_by_value(&b.raw_value).unwrap());
    }

    /// Deletes slots expired at or before a timestamp
    #[test]
    fn deletes_slots_expired_at_or_before_a_timestamp() {
        let mut store = MemoryStore::new();
        for (id, ts) in [("a", 30), ("b", 10), ("c", 20)] {
            store.insert_bonus_slot(BonusSlot::new(id, at(ts))).unwrap();
        }
        let ids: Vec<_> = store
            .list_bonus_slots()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, ["b", "c", "a"]);

        assert_eq!(store.delete_bonus_slots_expired_before(at(20)).unwrap(), 2);
        assert_eq!(store.list_bonus_slots().unwrap(), [BonusSlot::new("a", at(30))]);
    }

    /// Stores a single entitlement record
    #[test]
    fn stores_a_single_entitlement_record() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get_entitlement().unwrap(), None);

        let on = crate::EntitlementState::default().toggled(at(5));
        store.upsert_entitlement(on.clone()).unwrap();
        store.upsert_entitlement(on.toggled(at(6))).unwrap();
        let current = store.get_entitlement().unwrap().unwrap();
        assert!(!current.is_pro);
        assert_eq!(current.last_sync_at, Some(at(6)));
    }
}
