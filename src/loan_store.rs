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

//! Loan record store.
//!
//! Append-only storage of loan records keyed by loan id. The linchpin for
//! idempotent returns is [`update_status`](LoanStore::update_status): a
//! compare-and-set on the stored status that serializes concurrent return
//! attempts — exactly one caller observes `Borrowed` and wins.

use crate::LedgerError;
use crate::base::LoanId;
use crate::loan::{Loan, LoanStatus, NewLoan};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};

/// Store of loan records.
///
/// Implementations must make [`update_status`](LoanStore::update_status)
/// atomic with respect to arbitrary concurrent callers.
pub trait LoanStore: Send + Sync {
    /// Persists a new loan with status `Borrowed`, assigning its id.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WriteError`] on persistence failure.
    fn create(&self, loan: NewLoan) -> Result<Loan, LedgerError>;

    /// Fetches a loan snapshot by id.
    ///
    /// # Errors
    ///
    /// [`LedgerError::LoanNotFound`] if absent.
    fn find_by_id(&self, id: &LoanId) -> Result<Loan, LedgerError>;

    /// Returns a lazy, restartable sequence over all loans.
    ///
    /// [`MemoryLoanStore`] yields loans in stable created-order.
    fn find_all(&self) -> Box<dyn Iterator<Item = Loan> + '_>;

    /// Atomically updates the status only if the stored status equals
    /// `expected`, setting `return_date` alongside. Returns the
    /// post-transition record.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Conflict`] if the stored status differs from
    ///   `expected` (already returned, or concurrently mutated).
    /// - [`LedgerError::LoanNotFound`] if absent.
    fn update_status(
        &self,
        id: &LoanId,
        expected: LoanStatus,
        next: LoanStatus,
        return_date: DateTime<Utc>,
    ) -> Result<Loan, LedgerError>;
}

/// In-memory loan store.
///
/// Records live behind per-loan mutexes inside a [`DashMap`]; a separate
/// index preserves creation order for [`find_all`](LoanStore::find_all).
#[derive(Debug, Default)]
pub struct MemoryLoanStore {
    loans: DashMap<LoanId, Mutex<Loan>>,
    /// Loan ids in creation order.
    order: RwLock<Vec<LoanId>>,
    next_id: AtomicU64,
}

impl MemoryLoanStore {
    pub fn new() -> Self {
        Self {
            loans: DashMap::new(),
            order: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }
}

impl LoanStore for MemoryLoanStore {
    fn create(&self, loan: NewLoan) -> Result<Loan, LedgerError> {
        let id = LoanId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = Loan {
            id,
            item_id: loan.item_id,
            user_id: loan.user_id,
            borrow_date: loan.borrow_date,
            due_date: loan.due_date,
            status: LoanStatus::Borrowed,
            return_date: None,
        };
        self.loans.insert(id, Mutex::new(record.clone()));
        self.order.write().push(id);
        Ok(record)
    }

    fn find_by_id(&self, id: &LoanId) -> Result<Loan, LedgerError> {
        let entry = self.loans.get(id).ok_or(LedgerError::LoanNotFound)?;
        let loan = entry.lock().clone();
        Ok(loan)
    }

    fn find_all(&self) -> Box<dyn Iterator<Item = Loan> + '_> {
        // Snapshot the id list; records are cloned lazily as the caller
        // advances, so a fresh call restarts from a fresh snapshot.
        let ids: Vec<LoanId> = self.order.read().clone();
        Box::new(
            ids.into_iter()
                .filter_map(move |id| self.loans.get(&id).map(|entry| entry.lock().clone())),
        )
    }

    fn update_status(
        &self,
        id: &LoanId,
        expected: LoanStatus,
        next: LoanStatus,
        return_date: DateTime<Utc>,
    ) -> Result<Loan, LedgerError> {
        let entry = self.loans.get(id).ok_or(LedgerError::LoanNotFound)?;
        let mut loan = entry.lock();
        if loan.status != expected {
            return Err(LedgerError::Conflict);
        }
        loan.status = next;
        loan.return_date = Some(return_date);
        Ok(loan.clone())
    }
}
