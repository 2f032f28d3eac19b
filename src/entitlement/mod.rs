/// Entitlement gate
///
/// Decides whether a recommendation request may run at all. Subscribers pass
/// unconditionally; everyone else is metered against a small monthly quota.
/// The gate is consulted before the orchestrator and shares its tolerance for
/// partial failure: the backend mirror is fire-and-forget, and an unreachable
/// entitlement backend degrades to limited access, never unlimited.
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::AppResult;

pub mod backend;
pub mod quota;

pub use backend::{EntitlementBackend, EntitlementRecord, EntitlementSnapshot, HttpEntitlementBackend};
pub use quota::{QuotaStore, SqliteQuotaStore, UsageCounter};

/// Subscription status derived from raw entitlement facts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// No entitlement check has resolved yet; gated exactly like Free
    Unknown,
    Free,
    Active,
    /// Canceled but still inside a paid window
    GracePeriod,
    Expired,
}

impl SubscriptionStatus {
    /// Whether this status consumes the monthly quota
    pub fn is_metered(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Unknown | SubscriptionStatus::Free | SubscriptionStatus::Expired
        )
    }
}

/// Derivation rule: an active entitlement wins outright; otherwise a future
/// expiration means a still-running paid window, a past purchase means the
/// subscription lapsed, and a blank history means the user never paid.
pub fn derive_status(snapshot: &EntitlementSnapshot, now: DateTime<Utc>) -> SubscriptionStatus {
    if !snapshot.active_entitlements.is_empty() {
        return SubscriptionStatus::Active;
    }

    let future_expiration = snapshot
        .all_entitlements
        .iter()
        .any(|e| e.expiration_date.is_some_and(|exp| exp > now));
    if future_expiration {
        return SubscriptionStatus::GracePeriod;
    }

    let any_purchase = snapshot
        .all_entitlements
        .iter()
        .any(|e| e.last_purchase_date.is_some());
    if any_purchase {
        return SubscriptionStatus::Expired;
    }

    SubscriptionStatus::Free
}

pub struct EntitlementGate {
    store: Arc<dyn QuotaStore>,
    backend: Arc<dyn EntitlementBackend>,
    max_free_invocations: u32,
}

impl EntitlementGate {
    pub fn new(
        store: Arc<dyn QuotaStore>,
        backend: Arc<dyn EntitlementBackend>,
        max_free_invocations: u32,
    ) -> Self {
        Self {
            store,
            backend,
            max_free_invocations,
        }
    }

    /// Fetches entitlement facts and derives the status. A backend failure
    /// yields Unknown, which gates like Free.
    pub async fn status_for(&self, user_id: &str, now: DateTime<Utc>) -> SubscriptionStatus {
        match self.backend.fetch_entitlements(user_id).await {
            Ok(snapshot) => derive_status(&snapshot, now),
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "Entitlement fetch failed, gating as Unknown");
                SubscriptionStatus::Unknown
            }
        }
    }

    /// The stored counter if it belongs to the current month, else a fresh one
    async fn current_counter(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<UsageCounter> {
        let period_key = UsageCounter::period_key_for(now);
        Ok(match self.store.load(user_id).await? {
            Some(counter) if counter.period_key == period_key => counter,
            _ => UsageCounter::new_for(now),
        })
    }

    /// Whether a pipeline run is allowed right now. Subscribers always pass
    /// and never consult the counter.
    pub async fn can_invoke(
        &self,
        user_id: &str,
        status: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        if !status.is_metered() {
            return Ok(true);
        }
        let counter = self.current_counter(user_id, now).await?;
        Ok(counter.count < self.max_free_invocations)
    }

    /// Consumes one quota unit after a successful pipeline run. Exactly one
    /// increment per user-initiated request; subscribers never touch the
    /// counter. The backend mirror runs fire-and-forget.
    pub async fn record_invocation(
        &self,
        user_id: &str,
        status: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if !status.is_metered() {
            return Ok(());
        }

        let mut counter = self.current_counter(user_id, now).await?;
        counter.count += 1;
        self.store.save(user_id, &counter).await?;

        tracing::debug!(
            user_id = %user_id,
            period = %counter.period_key,
            count = counter.count,
            "Recommendation quota consumed"
        );

        let backend = self.backend.clone();
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = backend.mirror_usage(&user_id, &counter).await {
                tracing::warn!(error = %e, user_id = %user_id, "Usage mirror failed");
            }
        });

        Ok(())
    }
}
