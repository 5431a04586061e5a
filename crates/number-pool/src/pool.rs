//! In-memory number pool with exclusive leases.

use crate::error::PoolError;
use crate::types::{LeaseState, Number};
use async_trait::async_trait;
use rand::seq::IteratorRandom;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Allocation contract for leasable numbers.
///
/// Leases are exclusive: `claim_random` atomically marks the number as
/// leased, so two callers can never be handed the same number. A claim
/// ends either in `retire` (OTP confirmed, number gone for good) or in
/// `release` (timeout or cancellation, number allocatable again).
#[async_trait]
pub trait NumberPool: Send + Sync {
    /// Claim one arbitrarily-chosen available number for the country,
    /// or `None` if the group is exhausted.
    async fn claim_random(&self, country_code: &str) -> Option<Number>;

    /// Return a leased number to the available set. No-op for numbers
    /// that are not currently leased.
    async fn release(&self, value: &str) -> bool;

    /// Permanently delete a number. Idempotent: exactly one caller
    /// observes `true`, all later calls are a no-op.
    async fn retire(&self, value: &str) -> bool;

    /// Snapshot of every number still in the pool, leased included.
    async fn list(&self) -> Vec<Number>;
}

struct PoolEntry {
    number: Number,
    state: LeaseState,
}

/// In-memory pool. All mutation happens under a single write lock, so
/// claim/release/retire are atomic relative to each other.
#[derive(Clone)]
pub struct MemoryPool {
    entries: Arc<RwLock<HashMap<String, PoolEntry>>>,
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPool {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a number as available. Re-inserting an existing value
    /// overwrites it (and clears any lease).
    pub async fn insert(&self, number: Number) {
        let mut entries = self.entries.write().await;
        entries.insert(
            number.value.clone(),
            PoolEntry {
                number,
                state: LeaseState::Available,
            },
        );
    }

    /// Seed the pool from a JSON array of numbers.
    pub async fn load_seed(&self, path: impl AsRef<Path>) -> Result<usize, PoolError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let numbers: Vec<Number> = serde_json::from_str(&raw)?;
        let count = numbers.len();

        let mut entries = self.entries.write().await;
        for number in numbers {
            entries.insert(
                number.value.clone(),
                PoolEntry {
                    number,
                    state: LeaseState::Available,
                },
            );
        }

        info!("Seeded pool with {} numbers", count);
        Ok(count)
    }

    /// Count available numbers for a country.
    pub async fn available_count(&self, country_code: &str) -> usize {
        let entries = self.entries.read().await;
        entries
            .values()
            .filter(|e| e.state == LeaseState::Available && e.number.country_code == country_code)
            .count()
    }

    /// Total numbers still in the pool.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl NumberPool for MemoryPool {
    async fn claim_random(&self, country_code: &str) -> Option<Number> {
        let mut entries = self.entries.write().await;

        let value = entries
            .values()
            .filter(|e| e.state == LeaseState::Available && e.number.country_code == country_code)
            .map(|e| e.number.value.clone())
            .choose(&mut rand::thread_rng())?;

        let entry = entries.get_mut(&value)?;
        entry.state = LeaseState::Leased;
        debug!("Claimed {} for country {}", value, country_code);
        Some(entry.number.clone())
    }

    async fn release(&self, value: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(value) {
            Some(entry) if entry.state == LeaseState::Leased => {
                entry.state = LeaseState::Available;
                debug!("Released {} back to pool", value);
                true
            }
            _ => false,
        }
    }

    async fn retire(&self, value: &str) -> bool {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(value).is_some();
        if removed {
            info!("Retired {} from pool", value);
        } else {
            debug!("Retire of {} was a no-op (already gone)", value);
        }
        removed
    }

    async fn list(&self) -> Vec<Number> {
        let entries = self.entries.read().await;
        entries.values().map(|e| e.number.clone()).collect()
    }
}
