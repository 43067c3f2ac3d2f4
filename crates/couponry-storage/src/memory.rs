use async_trait::async_trait;
use couponry_core::store::{CouponStore, Result};
use couponry_core::{CodePattern, Coupon, CouponCode, PromotionId, StoreError};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// In-memory implementation of the CouponStore trait using DashMap.
///
/// Reads go straight to the sharded map. Batches are written one at a time
/// behind `write_gate`: a batch is checked in full before any of its codes
/// is inserted, so a rejected batch is never visible to readers.
#[derive(Debug)]
pub struct InMemoryCouponStore {
    storage: DashMap<String, Coupon>,
    write_gate: Mutex<()>,
}

impl InMemoryCouponStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
            write_gate: Mutex::new(()),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn contains(&self, code: &CouponCode) -> bool {
        self.storage.contains_key(code.as_str())
    }

    /// Returns every stored code, in no particular order.
    pub fn codes(&self) -> Vec<CouponCode> {
        self.storage
            .iter()
            .map(|entry| entry.value().code().clone())
            .collect()
    }

    /// Returns the coupons owned by `promotion`, in no particular order.
    pub fn coupons_for(&self, promotion: PromotionId) -> Vec<Coupon> {
        self.storage
            .iter()
            .filter(|entry| entry.value().promotion() == promotion)
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn insert_batch(&self, coupons: &[Coupon]) -> Result<()> {
        // the gate guards no data, so poisoning leaves nothing inconsistent
        let _gate = self
            .write_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut batch = HashSet::with_capacity(coupons.len());
        for coupon in coupons {
            let code = coupon.code().as_str();
            if !batch.insert(code) || self.storage.contains_key(code) {
                return Err(StoreError::Conflict(code.to_owned()));
            }
        }

        for coupon in coupons {
            self.storage
                .insert(coupon.code().as_str().to_owned(), coupon.clone());
        }
        Ok(())
    }
}

impl Default for InMemoryCouponStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn count_matching(&self, pattern: &CodePattern) -> Result<u64> {
        let count = self
            .storage
            .iter()
            .filter(|entry| pattern.matches(entry.key()))
            .count();
        Ok(count as u64)
    }

    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>> {
        Ok(self
            .storage
            .get(code.as_str())
            .map(|entry| entry.value().clone()))
    }

    async fn save_all(&self, coupons: &[Coupon]) -> Result<()> {
        self.insert_batch(coupons)
    }
}
