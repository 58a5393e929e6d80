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

//! Lending ledger orchestrator.
//!
//! The [`Ledger`] coordinates the inventory store and the loan store to
//! implement `borrow` and `return` with cross-entity consistency. The
//! composed operation is not transactional across the two stores; instead
//! ordering (decrement before create, status transition before increment)
//! plus compensation bounds the inconsistency window to "stock
//! under-counted, never over-lent".
//!
//! # Thread Safety
//!
//! The ledger holds no mutable state between calls and may be invoked
//! from any number of concurrent execution contexts. Atomicity lives in
//! the stores' guarded primitives, never in a ledger-wide lock.

use crate::base::{ItemId, LoanId, UserId};
use crate::catalog::Catalog;
use crate::clock::{Clock, SystemClock};
use crate::inventory::InventoryStore;
use crate::loan::{LoanStatus, LoanView, NewLoan};
use crate::loan_store::LoanStore;
use crate::LedgerError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{debug, error};

/// Due dates arrive as ISO-8601 calendar dates, e.g. `2030-01-15`.
const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Orchestrator enforcing consistency between inventory and loan records.
///
/// # Invariants
///
/// - An item's available quantity never goes negative, whatever the
///   caller concurrency.
/// - A loan's status transitions at most once, from `Borrowed` to exactly
///   one of `Returned` / `LateReturned`.
/// - No exit path leaves a decrement uncompensated unless the
///   compensation itself failed, in which case the call surfaces
///   [`LedgerError::Inconsistent`].
pub struct Ledger {
    inventory: Arc<dyn InventoryStore>,
    loans: Arc<dyn LoanStore>,
    catalog: Option<Arc<dyn Catalog>>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Creates a ledger over the given stores, using wall-clock time and
    /// no catalog collaborator (item existence then falls to the
    /// inventory store's `ItemNotFound`).
    pub fn new(inventory: Arc<dyn InventoryStore>, loans: Arc<dyn LoanStore>) -> Self {
        Ledger {
            inventory,
            loans,
            catalog: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Consults the given catalog for item existence before touching
    /// inventory.
    pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Replaces the time source, e.g. with a pinned clock in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Borrows one copy of an item for a user.
    ///
    /// Steps: validate the due date, check item existence, guarded
    /// decrement, create the loan record. A failed create is compensated
    /// by re-incrementing inventory before the error is surfaced, so a
    /// transient store failure cannot permanently shrink stock.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] - due date malformed or not strictly
    ///   in the future.
    /// - [`LedgerError::ItemNotFound`] - unknown item.
    /// - [`LedgerError::OutOfStock`] - no available copy; nothing was
    ///   mutated.
    /// - [`LedgerError::WriteError`] - loan creation failed; the
    ///   decrement was compensated and the call may be retried.
    /// - [`LedgerError::Inconsistent`] - loan creation failed and the
    ///   compensating increment also failed; stock is under-counted and
    ///   needs operator attention.
    pub fn borrow(
        &self,
        user_id: UserId,
        item_id: ItemId,
        due_date_raw: &str,
    ) -> Result<LoanView, LedgerError> {
        let now = self.clock.now();
        let due_date = self.parse_due_date(due_date_raw, now)?;

        if let Some(catalog) = &self.catalog {
            if !catalog.item_exists(&item_id) {
                return Err(LedgerError::ItemNotFound);
            }
        }

        // Guarded decrement first: a loser here aborts with no loan
        // record and no partial state.
        self.inventory.try_decrement(&item_id)?;

        let created = self.loans.create(NewLoan {
            item_id,
            user_id,
            borrow_date: now,
            due_date,
        });

        let loan = match created {
            Ok(loan) => loan,
            Err(create_err) => {
                // Compensate the decrement, then surface the original
                // failure. Cancellation mid-call lands here as well.
                return match self.inventory.increment(&item_id) {
                    Ok(()) => Err(create_err),
                    Err(comp_err) => {
                        error!(
                            item = %item_id,
                            cause = %create_err,
                            compensation = %comp_err,
                            "stock decrement could not be compensated"
                        );
                        Err(LedgerError::Inconsistent(format!(
                            "loan creation failed ({create_err}) and compensation failed ({comp_err})"
                        )))
                    }
                };
            }
        };

        debug!(loan = %loan.id, item = %item_id, user = %user_id, "loan created");
        Ok(loan.into())
    }

    /// Returns a borrowed loan, marking it late when past its due date.
    ///
    /// The conditional status update is the race arbiter: of any number
    /// of concurrent returns for one loan, exactly one observes
    /// `Borrowed` and proceeds to the inventory increment; the rest fail
    /// with `Conflict` and touch nothing.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::LoanNotFound`] - unknown loan.
    /// - [`LedgerError::Forbidden`] - the loan belongs to another user.
    /// - [`LedgerError::Conflict`] - the loan already left `Borrowed`;
    ///   inventory was not touched, so a racing caller cannot
    ///   double-credit stock.
    /// - [`LedgerError::Inconsistent`] - the status transition committed
    ///   but the inventory increment failed; the partial state is
    ///   reported, never swallowed.
    pub fn return_loan(&self, loan_id: LoanId, user_id: UserId) -> Result<LoanView, LedgerError> {
        let loan = self.loans.find_by_id(&loan_id)?;

        if loan.user_id != user_id {
            return Err(LedgerError::Forbidden);
        }
        if loan.status.is_terminal() {
            return Err(LedgerError::Conflict);
        }

        let now = self.clock.now();
        let next = if is_late(loan.due_date, now) {
            LoanStatus::LateReturned
        } else {
            LoanStatus::Returned
        };

        // Compare-and-set on the status; a Conflict loss means a
        // concurrent return already credited inventory.
        let updated = self
            .loans
            .update_status(&loan_id, LoanStatus::Borrowed, next, now)?;

        if let Err(inc_err) = self.inventory.increment(&loan.item_id) {
            error!(
                loan = %loan_id,
                item = %loan.item_id,
                cause = %inc_err,
                "loan returned but stock increment failed"
            );
            return Err(LedgerError::Inconsistent(format!(
                "loan {loan_id} returned but stock increment failed ({inc_err})"
            )));
        }

        debug!(loan = %loan_id, user = %user_id, status = ?updated.status, "loan returned");
        Ok(updated.into())
    }

    /// Fetches the public view of one loan.
    pub fn find_loan(&self, loan_id: LoanId) -> Result<LoanView, LedgerError> {
        self.loans.find_by_id(&loan_id).map(LoanView::from)
    }

    /// Iterates the public views of all loans, in the store's order.
    pub fn list_loans(&self) -> impl Iterator<Item = LoanView> + '_ {
        self.loans.find_all().map(LoanView::from)
    }

    fn parse_due_date(&self, raw: &str, now: DateTime<Utc>) -> Result<NaiveDate, LedgerError> {
        let due_date = NaiveDate::parse_from_str(raw, DUE_DATE_FORMAT).map_err(|_| {
            LedgerError::Validation(format!("malformed due date '{raw}', expected YYYY-MM-DD"))
        })?;
        // Strictly future: a due date of today would let a loan fall due
        // the moment it is created.
        if due_date <= now.date_naive() {
            return Err(LedgerError::Validation(format!(
                "due date '{raw}' must be after the current date"
            )));
        }
        Ok(due_date)
    }
}

/// A return is late once "now" has passed the due date's midnight.
/// Returning at exactly `due T00:00:00` is still on time.
fn is_late(due_date: NaiveDate, now: DateTime<Utc>) -> bool {
    now > due_date.and_time(NaiveTime::MIN).and_utc()
}
