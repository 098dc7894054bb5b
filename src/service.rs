//! The capability surface a UI binds to.
//!
//! [`UuidService`] combines a [`Generator`], a [`QuotaPolicy`], and the app's [`RecordStore`]. It
//! re-reads the store and prunes expired bonus slots before every quota decision, so concurrent
//! UI triggers never act on a stale capacity.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    parse_canonical, BonusSlot, EntitlementState, Error, FormatOptions, GeneratedUuid, Generator,
    LimitState, ParseError, QuotaPolicy, RandSource, RecordStore, Result, StoredUuidRecord, Uuid,
    UuidVersion,
};

/// Generation, formatting, and quota-checked persistence of UUIDs.
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use rand::rngs::OsRng;
/// use uuidgen_core::{FormatOptions, Generator, MemoryStore, UuidService, UuidVersion};
///
/// let mut service = UuidService::new(MemoryStore::new(), Generator::with_rand08(OsRng));
/// let now = Utc::now();
/// let generated = service.generate(UuidVersion::V4, None, None, now)?;
/// let record = service.save(&generated, None, FormatOptions::default(), now)?;
/// assert_eq!(service.history()?, [record]);
/// # Ok::<(), uuidgen_core::Error>(())
/// ```
#[derive(Debug)]
pub struct UuidService<S, R> {
    store: S,
    generator: Generator<R>,
    policy: QuotaPolicy,
}

impl<S: RecordStore, R: RandSource> UuidService<S, R> {
    /// Creates a service with the default quota policy.
    pub fn new(store: S, generator: Generator<R>) -> Self {
        Self::with_policy(store, generator, QuotaPolicy::default())
    }

    /// Creates a service with a custom quota policy.
    pub fn with_policy(store: S, generator: Generator<R>, policy: QuotaPolicy) -> Self {
        Self {
            store,
            generator,
            policy,
        }
    }

    /// Returns the quota policy in effect.
    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the service, returning the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Generates a UUID; see [`Generator::generate`].
    pub fn generate(
        &mut self,
        version: UuidVersion,
        namespace: Option<&str>,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<GeneratedUuid> {
        self.generator.generate(version, namespace, name, now)
    }

    /// Renders `uuid` for display or export.
    pub fn format(&self, uuid: &Uuid, options: FormatOptions) -> String {
        options.apply(uuid)
    }

    /// Parses any rendering produced by [`UuidService::format`].
    pub fn parse_canonical(&self, src: &str) -> Result<Uuid, ParseError> {
        parse_canonical(src)
    }

    /// Removes expired bonus slots from the store, returning how many were removed.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let removed = self
            .store
            .delete_bonus_slots_expired_before(now)
            .map_err(Error::store)?;
        if removed > 0 {
            debug!(removed, "pruned expired bonus slots");
        }
        Ok(removed)
    }

    /// Returns the entitlement, writing the free default first if the store has none.
    pub fn entitlement(&mut self) -> Result<EntitlementState> {
        if let Some(state) = self.store.get_entitlement().map_err(Error::store)? {
            return Ok(state);
        }
        let state = EntitlementState::default();
        self.store
            .upsert_entitlement(state.clone())
            .map_err(Error::store)?;
        Ok(state)
    }

    /// Prunes expired slots and returns the active ones.
    pub fn bonus_slots(&mut self, now: DateTime<Utc>) -> Result<Vec<BonusSlot>> {
        self.refresh(now)?;
        self.store.list_bonus_slots().map_err(Error::store)
    }

    /// Derives the current limit state from fresh store contents.
    pub fn limit_state(&mut self, now: DateTime<Utc>) -> Result<LimitState> {
        let slots = self.bonus_slots(now)?;
        let entitlement = self.entitlement()?;
        Ok(self.policy.limit_state(&entitlement, &slots, now))
    }

    /// Returns `true` if one more item may be saved at `now`.
    pub fn can_save(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let state = self.limit_state(now)?;
        let count = self.store.count_items().map_err(Error::store)?;
        Ok(state.can_admit(count))
    }

    /// Saves `generated` with an optional label and the options it is displayed with.
    ///
    /// # Errors
    ///
    /// - [`Error::LimitReached`] if the quota is exhausted.
    /// - [`Error::DuplicateValue`] if the value is already stored.
    ///
    /// Nothing is written on failure.
    pub fn save(
        &mut self,
        generated: &GeneratedUuid,
        label: Option<&str>,
        format_options: FormatOptions,
        now: DateTime<Utc>,
    ) -> Result<StoredUuidRecord> {
        let state = self.limit_state(now)?;
        let count = self.store.count_items().map_err(Error::store)?;
        let record = generated.to_record(label, format_options);
        let exists = self
            .store
            .exists_by_value(&record.raw_value)
            .map_err(Error::store)?;

        if let Err(err) = state.admit_save(count, exists) {
            warn!(%err, count, capacity = state.capacity(), value = %record.raw_value, "save rejected");
            return Err(err);
        }

        self.store
            .insert_item(record.clone())
            .map_err(Error::store)?;
        debug!(id = %record.id, version = %record.version, "saved UUID");
        Ok(record)
    }

    /// Lists saved records, newest first.
    pub fn history(&self) -> Result<Vec<StoredUuidRecord>> {
        self.store.list_items().map_err(Error::store)
    }

    /// Deletes the record with id `id`, if any.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        self.store.delete_item(id).map_err(Error::store)
    }

    /// Deletes every saved record.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear_items().map_err(Error::store)?;
        info!("cleared saved UUIDs");
        Ok(())
    }

    /// Grants a bonus slot lasting one bonus duration from `now`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BonusLimitReached`] if the maximum number of slots is already active. No
    /// randomness is drawn in that case.
    pub fn grant_bonus_slot(&mut self, now: DateTime<Utc>) -> Result<BonusSlot> {
        let slots = self.bonus_slots(now)?;
        let expires_at = match self.policy.bonus_expiry(&slots, now) {
            Ok(expires_at) => expires_at,
            Err(err) => {
                warn!(%err, active = slots.len(), "bonus slot denied");
                return Err(err);
            }
        };
        let slot = BonusSlot::new(self.generator.generate_v4()?, expires_at);
        self.store
            .insert_bonus_slot(slot.clone())
            .map_err(Error::store)?;
        info!(id = %slot.id, expires_at = %slot.expires_at, "granted bonus slot");
        Ok(slot)
    }

    /// Flips the Pro entitlement and persists the result.
    pub fn toggle_pro(&mut self, now: DateTime<Utc>) -> Result<EntitlementState> {
        let updated = self.entitlement()?.toggled(now);
        self.store
            .upsert_entitlement(updated.clone())
            .map_err(Error::store)?;
        info!(is_pro = updated.is_pro, "toggled entitlement");
        Ok(updated)
    }
}
