//! Storage quota rules: base limit, time-limited bonus slots, and the Pro entitlement.
//!
//! Everything here is a pure function of the snapshots passed in. Callers load the entitlement
//! and bonus slots from their store, prune expired slots, and ask for a decision immediately
//! before acting on it:
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use uuidgen_core::quota::{BonusSlot, EntitlementState, QuotaPolicy};
//!
//! let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
//! let policy = QuotaPolicy::default();
//! let slots = vec![
//!     BonusSlot::new("a", now + Duration::hours(1)),
//!     BonusSlot::new("b", now - Duration::hours(1)),
//! ];
//!
//! let state = policy.limit_state(&EntitlementState::default(), &slots, now);
//! assert_eq!(state.capacity(), 11);
//! assert!(state.can_admit(10));
//! assert!(!state.can_admit(11));
//! ```
//!
//! Expiry is lazy: a slot stops counting once `now >= expires_at`, whether or not it has been
//! removed from the store yet.

use chrono::{DateTime, Duration, Utc};

use crate::{Error, Result};

/// Items a free user may store without bonus slots.
pub const BASE_LIMIT: usize = 10;

/// Maximum number of bonus slots that may be active at once.
pub const MAX_BONUS: usize = 5;

/// Lifetime of a bonus slot in milliseconds (24 hours).
pub const BONUS_DURATION_MS: i64 = 24 * 60 * 60 * 1000;

/// A time-limited grant that raises the free-tier capacity by one.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BonusSlot {
    pub id: String,
    pub expires_at: DateTime<Utc>,
}

impl BonusSlot {
    /// Creates a slot record.
    pub fn new(id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            expires_at,
        }
    }

    /// Returns `true` once `now` has reached the expiry time.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Returns the time left before expiry, or zero if already expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// Returns the slots that are still active at `now`.
pub fn prune_expired_bonus_slots(slots: &[BonusSlot], now: DateTime<Utc>) -> Vec<BonusSlot> {
    slots
        .iter()
        .filter(|slot| !slot.is_expired(now))
        .cloned()
        .collect()
}

/// Counts the slots that are still active at `now`.
pub fn active_bonus_count(slots: &[BonusSlot], now: DateTime<Utc>) -> usize {
    slots.iter().filter(|slot| !slot.is_expired(now)).count()
}

/// The persisted Pro entitlement.
///
/// There is one logical record. It has two states, free and Pro, and changes only through
/// [`EntitlementState::toggled`].
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntitlementState {
    pub is_pro: bool,
    pub pro_since: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl EntitlementState {
    /// Returns the state after flipping `is_pro` at `now`.
    ///
    /// Turning Pro on sets `pro_since` to `now`; turning it off clears it. `last_sync_at` is
    /// stamped either way.
    #[must_use]
    pub fn toggled(&self, now: DateTime<Utc>) -> Self {
        let is_pro = !self.is_pro;
        Self {
            is_pro,
            pro_since: is_pro.then_some(now),
            last_sync_at: Some(now),
        }
    }
}

/// Flips the entitlement; see [`EntitlementState::toggled`].
pub fn toggle_entitlement(current: &EntitlementState, now: DateTime<Utc>) -> EntitlementState {
    current.toggled(now)
}

/// The capacity figures derived from an entitlement and the active bonus slots.
///
/// This is recomputed for every decision and never stored.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LimitState {
    pub is_pro: bool,
    pub base_limit: usize,

    /// Active bonus slots, already capped at the policy maximum.
    pub bonus_active: usize,
}

impl LimitState {
    /// Returns how many items may be stored, or `usize::MAX` for Pro.
    pub const fn capacity(&self) -> usize {
        if self.is_pro {
            usize::MAX
        } else {
            self.base_limit.saturating_add(self.bonus_active)
        }
    }

    /// Returns `true` if one more item may be stored on top of `current_count`.
    pub const fn can_admit(&self, current_count: usize) -> bool {
        self.is_pro || current_count < self.capacity()
    }

    /// Decides whether a candidate may be saved.
    ///
    /// `already_stored` reports whether a record with the candidate's canonical value exists;
    /// uniqueness is on the value, not on the record id.
    ///
    /// # Errors
    ///
    /// [`Error::LimitReached`] takes precedence over [`Error::DuplicateValue`].
    pub fn admit_save(&self, current_count: usize, already_stored: bool) -> Result<()> {
        if !self.can_admit(current_count) {
            Err(Error::LimitReached)
        } else if already_stored {
            Err(Error::DuplicateValue)
        } else {
            Ok(())
        }
    }
}

/// Tunable quota parameters.
///
/// The default is the app's policy: ten items, at most five bonus slots, each lasting 24 hours.
///
/// Policies deserialized from host configuration are validated the same way as
/// [`QuotaPolicy::new`]; missing fields take their default values.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PolicyFields"))]
pub struct QuotaPolicy {
    pub base_limit: usize,
    pub max_bonus: usize,
    pub bonus_duration_ms: i64,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            base_limit: BASE_LIMIT,
            max_bonus: MAX_BONUS,
            bonus_duration_ms: BONUS_DURATION_MS,
        }
    }
}

/// The raw shape of a policy in host configuration, before validation.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct PolicyFields {
    base_limit: usize,
    max_bonus: usize,
    bonus_duration_ms: i64,
}

#[cfg(feature = "serde")]
impl Default for PolicyFields {
    fn default() -> Self {
        let QuotaPolicy {
            base_limit,
            max_bonus,
            bonus_duration_ms,
        } = QuotaPolicy::default();
        Self {
            base_limit,
            max_bonus,
            bonus_duration_ms,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<PolicyFields> for QuotaPolicy {
    type Error = Error;

    fn try_from(src: PolicyFields) -> Result<Self> {
        Self::new(src.base_limit, src.max_bonus, src.bonus_duration_ms)
    }
}

impl QuotaPolicy {
    /// Creates a policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBonusDuration`] if `bonus_duration_ms` is not positive.
    pub fn new(base_limit: usize, max_bonus: usize, bonus_duration_ms: i64) -> Result<Self> {
        let policy = Self {
            base_limit,
            max_bonus,
            bonus_duration_ms,
        };
        policy.bonus_duration()?;
        Ok(policy)
    }

    /// Returns the lifetime of a newly granted bonus slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBonusDuration`] if `bonus_duration_ms` is not positive.
    pub fn bonus_duration(&self) -> Result<Duration> {
        if self.bonus_duration_ms <= 0 {
            return Err(Error::InvalidBonusDuration(self.bonus_duration_ms));
        }
        Ok(Duration::milliseconds(self.bonus_duration_ms))
    }

    /// Derives the limit state at `now`.
    ///
    /// Expired slots in `slots` are ignored and the active count is clamped to `max_bonus`
    /// silently.
    pub fn limit_state(
        &self,
        entitlement: &EntitlementState,
        slots: &[BonusSlot],
        now: DateTime<Utc>,
    ) -> LimitState {
        LimitState {
            is_pro: entitlement.is_pro,
            base_limit: self.base_limit,
            bonus_active: active_bonus_count(slots, now).min(self.max_bonus),
        }
    }

    /// Checks whether a bonus slot may be granted at `now` and returns its expiry.
    ///
    /// # Errors
    ///
    /// - [`Error::BonusLimitReached`] if `max_bonus` slots in `slots` are still active.
    /// - [`Error::InvalidBonusDuration`] if the policy's duration is not positive.
    /// - [`Error::ExpiryOutOfRange`] if the expiry does not fit in a [`DateTime`].
    pub fn bonus_expiry(&self, slots: &[BonusSlot], now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        if active_bonus_count(slots, now) >= self.max_bonus {
            return Err(Error::BonusLimitReached);
        }
        now.checked_add_signed(self.bonus_duration()?)
            .ok_or(Error::ExpiryOutOfRange)
    }

    /// Creates a bonus slot with id `id` expiring one bonus duration after `now`.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`QuotaPolicy::bonus_expiry`].
    pub fn grant_bonus_slot(
        &self,
        slots: &[BonusSlot],
        now: DateTime<Utc>,
        id: impl Into<String>,
    ) -> Result<BonusSlot> {
        self.bonus_expiry(slots, now)
            .map(|expires_at| BonusSlot::new(id, expires_at))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;

    fn at(unix_ts_ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(unix_ts_ms).unwrap()
    }

    fn free() -> EntitlementState {
        EntitlementState::default()
    }

    fn pro() -> EntitlementState {
        free().toggled(at(0))
    }

    /// Admits ten items for a free user without bonus slots
    #[test]
    fn admits_ten_items_for_a_free_user_without_bonus_slots() {
        let state = QuotaPolicy::default().limit_state(&free(), &[], at(0));
        assert_eq!(state.capacity(), 10);
        for count in 0..10 {
            assert!(state.can_admit(count));
            assert!(state.admit_save(count, false).is_ok());
        }
        assert!(!state.can_admit(10));
        assert!(matches!(state.admit_save(10, false), Err(Error::LimitReached)));
    }

    /// Admits any count for Pro
    #[test]
    fn admits_any_count_for_pro() {
        let state = QuotaPolicy::default().limit_state(&pro(), &[], at(0));
        assert_eq!(state.capacity(), usize::MAX);
        assert!(state.can_admit(10));
        assert!(state.can_admit(usize::MAX));
    }

    /// Raises capacity by active bonus slots only
    #[test]
    fn raises_capacity_by_active_bonus_slots_only() {
        let now = at(1_000_000);
        let slots = [
            BonusSlot::new("a", now + Duration::milliseconds(1)),
            BonusSlot::new("b", now + Duration::hours(23)),
            BonusSlot::new("c", now),
            BonusSlot::new("d", now - Duration::milliseconds(1)),
        ];
        let state = QuotaPolicy::default().limit_state(&free(), &slots, now);
        assert_eq!(state.bonus_active, 2);
        assert_eq!(state.capacity(), 12);
        assert!(state.can_admit(11));
        assert!(!state.can_admit(12));
    }

    /// Clamps bonus slots to the maximum
    #[test]
    fn clamps_bonus_slots_to_the_maximum() {
        let now = at(0);
        let slots: Vec<_> = (0..8)
            .map(|i| BonusSlot::new(i.to_string(), now + Duration::hours(1)))
            .collect();
        let state = QuotaPolicy::default().limit_state(&free(), &slots, now);
        assert_eq!(state.bonus_active, MAX_BONUS);
        assert_eq!(state.capacity(), BASE_LIMIT + MAX_BONUS);
    }

    /// Prunes slots at or past their expiry
    #[test]
    fn prunes_slots_at_or_past_their_expiry() {
        let now = at(5_000);
        let slots = [
            BonusSlot::new("past", at(4_999)),
            BonusSlot::new("exact", at(5_000)),
            BonusSlot::new("future", at(5_001)),
        ];
        let active = prune_expired_bonus_slots(&slots, now);
        assert_eq!(active, [BonusSlot::new("future", at(5_001))]);
        assert_eq!(active_bonus_count(&slots, now), 1);
        assert_eq!(slots[2].remaining(now), Duration::milliseconds(1));
        assert_eq!(slots[0].remaining(now), Duration::zero());
    }

    /// Grants slots up to the maximum then again after one expires
    #[test]
    fn grants_slots_up_to_the_maximum_then_again_after_one_expires() {
        let policy = QuotaPolicy::default();
        let start = at(1_700_000_000_000);
        let mut slots = Vec::new();
        for i in 0..5 {
            let now = start + Duration::minutes(i);
            let slot = policy.grant_bonus_slot(&slots, now, i.to_string()).unwrap();
            assert_eq!(slot.expires_at, now + Duration::hours(24));
            slots.push(slot);
        }

        let result = policy.grant_bonus_slot(&slots, start + Duration::hours(1), "6");
        assert!(matches!(result, Err(Error::BonusLimitReached)));

        // the first slot expires exactly 24 hours after the start
        let later = start + Duration::hours(24);
        slots = prune_expired_bonus_slots(&slots, later);
        assert_eq!(slots.len(), 4);
        let slot = policy.grant_bonus_slot(&slots, later, "6").unwrap();
        assert_eq!(slot.id, "6");
    }

    /// Ignores expired slots when granting without an explicit prune
    #[test]
    fn ignores_expired_slots_when_granting_without_an_explicit_prune() {
        let policy = QuotaPolicy::default();
        let now = at(10_000);
        let slots: Vec<_> = (0..5)
            .map(|i| BonusSlot::new(i.to_string(), at(9_000)))
            .collect();
        assert!(policy.grant_bonus_slot(&slots, now, "x").is_ok());
    }

    /// Toggles entitlement back and forth
    #[test]
    fn toggles_entitlement_back_and_forth() {
        let t1 = at(1_000);
        let t2 = at(2_000);

        let on = toggle_entitlement(&free(), t1);
        assert!(on.is_pro);
        assert_eq!(on.pro_since, Some(t1));
        assert_eq!(on.last_sync_at, Some(t1));

        let off = toggle_entitlement(&on, t2);
        assert!(!off.is_pro);
        assert_eq!(off.pro_since, None);
        assert_eq!(off.last_sync_at, Some(t2));
    }

    /// Reports limit before duplicate
    #[test]
    fn reports_limit_before_duplicate() {
        let state = QuotaPolicy::default().limit_state(&free(), &[], at(0));
        assert!(matches!(state.admit_save(3, true), Err(Error::DuplicateValue)));
        assert!(matches!(state.admit_save(10, true), Err(Error::LimitReached)));

        let state = QuotaPolicy::default().limit_state(&pro(), &[], at(0));
        assert!(matches!(state.admit_save(1_000, true), Err(Error::DuplicateValue)));
    }

    /// Honors a custom policy
    #[test]
    fn honors_a_custom_policy() {
        let policy = QuotaPolicy {
            base_limit: 1,
            max_bonus: 1,
            bonus_duration_ms: 1_000,
        };
        let now = at(0);
        let slot = policy.grant_bonus_slot(&[], now, "a").unwrap();
        assert_eq!(slot.expires_at, at(1_000));
        let slots = [slot];
        assert!(policy.grant_bonus_slot(&slots, now, "b").is_err());
        assert_eq!(policy.limit_state(&free(), &slots, now).capacity(), 2);
        assert_eq!(policy.limit_state(&free(), &slots, at(1_000)).capacity(), 1);
    }

    /// Deserializes a partial policy over the defaults
    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_a_partial_policy_over_the_defaults() {
        let policy: QuotaPolicy = serde_json::from_str(r#"{"base_limit":3}"#).unwrap();
        assert_eq!(policy.base_limit, 3);
        assert_eq!(policy.max_bonus, MAX_BONUS);
        assert_eq!(policy.bonus_duration().unwrap(), Duration::hours(24));
    }

    /// Rejects a non-positive bonus duration in configuration
    #[cfg(feature = "serde")]
    #[test]
    fn rejects_a_non_positive_bonus_duration_in_configuration() {
        for json in [r#"{"bonus_duration_ms":0}"#, r#"{"bonus_duration_ms":-1}"#] {
            let err = serde_json::from_str::<QuotaPolicy>(json).unwrap_err();
            assert!(err.to_string().contains("bonus duration must be positive"), "{}", err);
        }
    }

    /// Rejects a non-positive bonus duration
    #[test]
    fn rejects_a_non_positive_bonus_duration() {
        assert!(matches!(
            QuotaPolicy::new(10, 5, 0),
            Err(Error::InvalidBonusDuration(0))
        ));
        assert!(matches!(
            QuotaPolicy::new(10, 5, -1),
            Err(Error::InvalidBonusDuration(-1))
        ));
        assert_eq!(QuotaPolicy::new(10, 5, BONUS_DURATION_MS).unwrap(), QuotaPolicy::default());

        // fields are public, so a grant re-checks the duration
        let policy = QuotaPolicy {
            bonus_duration_ms: -1,
            ..QuotaPolicy::default()
        };
        assert!(matches!(
            policy.grant_bonus_slot(&[], at(0), "a"),
            Err(Error::InvalidBonusDuration(-1))
        ));
    }

    /// Reports an expiry past the end of time instead of overflowing
    #[test]
    fn reports_an_expiry_past_the_end_of_time_instead_of_overflowing() {
        let policy = QuotaPolicy::new(10, 5, i64::MAX).unwrap();
        assert!(matches!(
            policy.grant_bonus_slot(&[], at(0), "a"),
            Err(Error::ExpiryOutOfRange)
        ));

        let near_end = DateTime::<Utc>::MAX_UTC - Duration::hours(1);
        assert!(matches!(
            QuotaPolicy::default().grant_bonus_slot(&[], near_end, "b"),
            Err(Error::ExpiryOutOfRange)
        ));

        let slot = QuotaPolicy::default()
            .grant_bonus_slot(&[], near_end - Duration::hours(24), "c")
            .unwrap();
        assert_eq!(slot.expires_at, near_end);
    }
}
