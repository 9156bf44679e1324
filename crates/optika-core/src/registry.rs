//! # Order Registry
//!
//! Open orders shared between tasks (several terminals, or a UI thread and
//! a payment callback touching the same order).
//!
//! ## Thread Safety
//! The map is wrapped in `Arc<Mutex<T>>`. Each order carries a version that
//! bumps on every committed change. Writers pass the version they last
//! read; a stale version is refused with `VersionConflict` instead of
//! silently overwriting a concurrent change.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Terminal A: get() → v3         Terminal B: get() → v3                  │
//! │  update(v3, add_payment) ✓ → v4                                         │
//! │                                 update(v3, apply_discount) ✗            │
//! │                                   VersionConflict { expected 3, at 4 }  │
//! │                                 get() → v4, retry                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Changes run against a copy of the order and are stored only when the
//! closure returns `Ok`, so a failed operation never leaves a half-applied
//! order behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::order::{Order, Receipt};

#[derive(Debug)]
struct Entry {
    order: Order,
    version: u64,
}

/// Open orders keyed by order id.
#[derive(Debug, Clone, Default)]
pub struct OrderRegistry {
    orders: Arc<Mutex<HashMap<String, Entry>>>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored entries are only replaced wholesale, so a panic inside a
    /// closure can't leave one half-written. The poison flag is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an order and returns its id. The first version is 1.
    pub fn open(&self, order: Order) -> String {
        let id = order.id().to_string();
        self.lock().insert(id.clone(), Entry { order, version: 1 });
        info!(order_id = %id, "Order registered");
        id
    }

    /// A copy of the order and its current version.
    pub fn get(&self, order_id: &str) -> CoreResult<(Order, u64)> {
        self.lock()
            .get(order_id)
            .map(|e| (e.order.clone(), e.version))
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))
    }

    /// Runs `f` with read access to the order.
    pub fn with_order<F, R>(&self, order_id: &str, f: F) -> CoreResult<R>
    where
        F: FnOnce(&Order) -> R,
    {
        let orders = self.lock();
        let entry = orders
            .get(order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        Ok(f(&entry.order))
    }

    /// Applies `f` to the order if it is still at `expected_version`.
    ///
    /// Returns the closure's value and the new version.
    ///
    /// ## Errors
    /// - `OrderNotFound`
    /// - `VersionConflict` when another writer committed first
    /// - whatever `f` returns; the stored order is then unchanged
    pub fn update<F, R>(&self, order_id: &str, expected_version: u64, f: F) -> CoreResult<(R, u64)>
    where
        F: FnOnce(&mut Order) -> CoreResult<R>,
    {
        let mut orders = self.lock();
        let entry = checked_entry(&mut orders, order_id, expected_version)?;

        let mut candidate = entry.order.clone();
        let result = f(&mut candidate)?;
        entry.order = candidate;
        entry.version += 1;

        debug!(order_id = %order_id, version = entry.version, "Order updated");
        Ok((result, entry.version))
    }

    /// Completes the order and hands it off: the receipt is returned and the
    /// order leaves the registry.
    ///
    /// The version check, completion and removal happen under one lock, so
    /// no other caller ever sees the completed order here.
    pub fn complete(&self, order_id: &str, expected_version: u64) -> CoreResult<Receipt> {
        let mut orders = self.lock();
        let entry = checked_entry(&mut orders, order_id, expected_version)?;

        let mut candidate = entry.order.clone();
        let receipt = candidate.complete()?;
        orders.remove(order_id);

        debug!(order_id = %order_id, "Order handed off");
        Ok(receipt)
    }

    /// Discards an open order.
    pub fn abandon(&self, order_id: &str) -> CoreResult<()> {
        let entry = self
            .lock()
            .remove(order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        entry.order.abandon();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// The entry for `order_id`, provided it is still at `expected_version`.
fn checked_entry<'a>(
    orders: &'a mut HashMap<String, Entry>,
    order_id: &str,
    expected_version: u64,
) -> CoreResult<&'a mut Entry> {
    let entry = orders
        .get_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

    if entry.version != expected_version {
        warn!(
            order_id = %order_id,
            expected = expected_version,
            actual = entry.version,
            "Update refused: stale version"
        );
        return Err(CoreError::VersionConflict {
            order_id: order_id.to_string(),
            expected: expected_version,
            actual: entry.version,
        });
    }

    Ok(entry)
}

// =============================================================================
// Unit Tests
// =============================================================================
