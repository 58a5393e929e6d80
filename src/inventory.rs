// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Item inventory store.
//!
//! Tracks each item's total and available quantity and exposes the two
//! guarded mutations the ledger composes: a compare-and-decrement and a
//! capped increment. Available quantity changes only through these paths.
//!
//! # Thread Safety
//!
//! [`MemoryInventory`] keeps per-item state behind a `parking_lot::Mutex`
//! inside a [`DashMap`]. The lock is held only for the single
//! read-modify-write, so two simultaneous decrements against an item with
//! one available copy yield exactly one success and one `OutOfStock`.

use crate::LedgerError;
use crate::base::ItemId;
use dashmap::DashMap;
use parking_lot::Mutex;

/// Store of per-item stock counters.
///
/// Implementations must make [`try_decrement`](InventoryStore::try_decrement)
/// and [`increment`](InventoryStore::increment) atomic with respect to
/// arbitrary concurrent callers; every other operation is a single read.
pub trait InventoryStore: Send + Sync {
    /// Creates the item or updates its total quantity, preserving the
    /// effect of outstanding loans on availability.
    fn register(&self, item_id: ItemId, total: u32) -> Result<(), LedgerError>;

    /// Returns the currently available quantity.
    ///
    /// # Errors
    ///
    /// [`LedgerError::ItemNotFound`] if the item is unknown.
    fn available(&self, item_id: &ItemId) -> Result<u32, LedgerError>;

    /// Atomically checks `available > 0` and decrements by one.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::OutOfStock`] if no copy is available.
    /// - [`LedgerError::ItemNotFound`] if the item is unknown.
    fn try_decrement(&self, item_id: &ItemId) -> Result<(), LedgerError>;

    /// Atomically increments by one, capped at the total quantity.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Inconsistent`] if the item is already at its total
    ///   (indicates a prior bookkeeping error).
    /// - [`LedgerError::ItemNotFound`] if the item is unknown.
    fn increment(&self, item_id: &ItemId) -> Result<(), LedgerError>;
}

#[derive(Debug)]
struct StockData {
    total: u32,
    available: u32,
}

impl StockData {
    fn assert_invariants(&self) {
        debug_assert!(
            self.available <= self.total,
            "Invariant violated: available {} exceeds total {}",
            self.available,
            self.total
        );
    }

    fn retotal(&mut self, total: u32) {
        // Outstanding loans keep their claim on copies across a restock.
        let on_loan = self.total - self.available;
        self.total = total;
        self.available = total.saturating_sub(on_loan);
        self.assert_invariants();
    }

    fn try_decrement(&mut self) -> Result<(), LedgerError> {
        if self.available == 0 {
            return Err(LedgerError::OutOfStock);
        }
        self.available -= 1;
        self.assert_invariants();
        Ok(())
    }

    fn increment(&mut self) -> Result<(), LedgerError> {
        if self.available >= self.total {
            return Err(LedgerError::Inconsistent(format!(
                "increment would raise available above total {}",
                self.total
            )));
        }
        self.available += 1;
        self.assert_invariants();
        Ok(())
    }
}

/// Per-item stock level with its own lock.
#[derive(Debug)]
struct StockCell {
    inner: Mutex<StockData>,
}

impl StockCell {
    fn new(total: u32) -> Self {
        Self {
            inner: Mutex::new(StockData {
                total,
                available: total,
            }),
        }
    }
}

/// In-memory inventory store.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    items: DashMap<ItemId, StockCell>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Returns `(total, available)` for reporting.
    pub fn quantities(&self, item_id: &ItemId) -> Result<(u32, u32), LedgerError> {
        let cell = self.items.get(item_id).ok_or(LedgerError::ItemNotFound)?;
        let data = cell.inner.lock();
        Ok((data.total, data.available))
    }
}

impl InventoryStore for MemoryInventory {
    fn register(&self, item_id: ItemId, total: u32) -> Result<(), LedgerError> {
        match self.items.entry(item_id) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                entry.get().inner.lock().retotal(total);
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(StockCell::new(total));
            }
        }
        Ok(())
    }

    fn available(&self, item_id: &ItemId) -> Result<u32, LedgerError> {
        let cell = self.items.get(item_id).ok_or(LedgerError::ItemNotFound)?;
        let available = cell.inner.lock().available;
        Ok(available)
    }

    fn try_decrement(&self, item_id: &ItemId) -> Result<(), LedgerError> {
        let cell = self.items.get(item_id).ok_or(LedgerError::ItemNotFound)?;
        cell.inner.lock().try_decrement()
    }

    fn increment(&self, item_id: &ItemId) -> Result<(), LedgerError> {
        let cell = self.items.get(item_id).ok_or(LedgerError::ItemNotFound)?;
        cell.inner.lock().increment()
    }
}
