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

//! Property-based tests for the lending ledger.
//!
//! These tests verify invariants that should hold for any sequence of
//! valid lending actions.

use chrono::{DateTime, Utc};
use lending_ledger_rs::{
    FixedClock, InventoryStore, ItemId, Ledger, LedgerError, LoanId, LoanStatus, MemoryInventory,
    MemoryLoanStore, UserId,
};
use proptest::prelude::*;
use std::sync::Arc;

const NOW: &str = "2023-12-20T10:00:00Z";
const DUE: &str = "2024-01-01";

fn now() -> DateTime<Utc> {
    NOW.parse().unwrap()
}

fn ledger_with_stock(stock: u32) -> (Ledger, Arc<MemoryInventory>, Arc<FixedClock>) {
    let inventory = Arc::new(MemoryInventory::new());
    inventory.register(ItemId(1), stock).unwrap();
    let clock = Arc::new(FixedClock::at(now()));
    let ledger = Ledger::new(inventory.clone(), Arc::new(MemoryLoanStore::new()))
        .with_clock(clock.clone());
    (ledger, inventory, clock)
}

// =============================================================================
// Inventory Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Available quantity never exceeds the registered total, whatever
    /// sequence of borrows and returns runs against the item.
    #[test]
    fn available_bounded_by_total(
        stock in 0u32..10,
        ops in prop::collection::vec(any::<bool>(), 0..40),
    ) {
        let (ledger, inventory, _) = ledger_with_stock(stock);
        let user = UserId(1);
        let mut open: Vec<LoanId> = Vec::new();

        for borrow_not_return in ops {
            if borrow_not_return {
                if let Ok(loan) = ledger.borrow(user, ItemId(1), DUE) {
                    open.push(loan.id);
                }
            } else if let Some(loan_id) = open.pop() {
                ledger.return_loan(loan_id, user).unwrap();
            }

            let (total, available) = inventory.quantities(&ItemId(1)).unwrap();
            prop_assert_eq!(total, stock);
            prop_assert!(available <= total);
        }
    }

    /// Copies on loan always equal total minus available: the ledger
    /// accounts for every decrement with exactly one open loan.
    #[test]
    fn open_loans_equal_missing_copies(
        stock in 1u32..10,
        ops in prop::collection::vec(any::<bool>(), 1..40),
    ) {
        let (ledger, inventory, _) = ledger_with_stock(stock);
        let user = UserId(1);
        let mut open: Vec<LoanId> = Vec::new();

        for borrow_not_return in ops {
            if borrow_not_return {
                if let Ok(loan) = ledger.borrow(user, ItemId(1), DUE) {
                    open.push(loan.id);
                }
            } else if let Some(loan_id) = open.pop() {
                ledger.return_loan(loan_id, user).unwrap();
            }
        }

        let (total, available) = inventory.quantities(&ItemId(1)).unwrap();
        let open_in_store = ledger
            .list_loans()
            .filter(|loan| loan.status == LoanStatus::Borrowed)
            .count();

        prop_assert_eq!(open_in_store, open.len());
        prop_assert_eq!((total - available) as usize, open_in_store);
    }

    /// Borrowing past the stock level always fails with OutOfStock and
    /// creates no loan record.
    #[test]
    fn borrow_beyond_stock_always_out_of_stock(
        stock in 0u32..6,
        extra in 1u32..6,
    ) {
        let (ledger, _, _) = ledger_with_stock(stock);

        for i in 0..stock {
            ledger.borrow(UserId(i), ItemId(1), DUE).unwrap();
        }
        for i in 0..extra {
            let result = ledger.borrow(UserId(stock + i), ItemId(1), DUE);
            prop_assert_eq!(result, Err(LedgerError::OutOfStock));
        }

        prop_assert_eq!(ledger.list_loans().count(), stock as usize);
    }
}

// =============================================================================
// Loan Lifecycle Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A returned loan's return date never precedes its borrow date, and
    /// is set exactly when the status is terminal.
    #[test]
    fn return_date_set_iff_terminal(
        hold_days in 0i64..100,
    ) {
        let (ledger, _, clock) = ledger_with_stock(1);
        let loan = ledger.borrow(UserId(1), ItemId(1), DUE).unwrap();
        prop_assert!(loan.return_date.is_none());

        clock.set(now() + chrono::Duration::days(hold_days));
        let returned = ledger.return_loan(loan.id, UserId(1)).unwrap();

        prop_assert!(returned.status.is_terminal());
        let return_date = returned.return_date.unwrap();
        prop_assert!(return_date >= returned.borrow_date);
    }

    /// Late iff returned after the due date's midnight.
    #[test]
    fn late_status_tracks_due_date(
        offset_hours in -240i64..240,
    ) {
        let (ledger, _, clock) = ledger_with_stock(1);
        let loan = ledger.borrow(UserId(1), ItemId(1), DUE).unwrap();

        let due_midnight: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().unwrap();
        let return_instant = due_midnight + chrono::Duration::hours(offset_hours);
        clock.set(return_instant);

        let returned = ledger.return_loan(loan.id, UserId(1)).unwrap();
        let expected = if return_instant > due_midnight {
            LoanStatus::LateReturned
        } else {
            LoanStatus::Returned
        };
        prop_assert_eq!(returned.status, expected);
    }

    /// Once terminal, every further return attempt fails with Conflict
    /// and neither the record nor the stock moves.
    #[test]
    fn terminal_loans_are_immutable(
        attempts in 1usize..10,
    ) {
        let (ledger, inventory, _) = ledger_with_stock(1);
        let loan = ledger.borrow(UserId(1), ItemId(1), DUE).unwrap();
        let first = ledger.return_loan(loan.id, UserId(1)).unwrap();

        for _ in 0..attempts {
            let result = ledger.return_loan(loan.id, UserId(1));
            prop_assert_eq!(result, Err(LedgerError::Conflict));
        }

        let stored = ledger.find_loan(loan.id).unwrap();
        prop_assert_eq!(stored.status, first.status);
        prop_assert_eq!(stored.return_date, first.return_date);
        prop_assert_eq!(inventory.available(&ItemId(1)).unwrap(), 1);
    }

    /// Loan ids are unique and listing preserves creation order no
    /// matter how borrows and returns interleave.
    #[test]
    fn loan_ids_unique_and_ordered(
        users in prop::collection::vec(0u32..5, 1..20),
    ) {
        let (ledger, _, _) = ledger_with_stock(100);

        let mut created = Vec::new();
        for (i, user) in users.iter().enumerate() {
            let loan = ledger.borrow(UserId(*user), ItemId(1), DUE).unwrap();
            created.push(loan.id);
            // Return every other loan immediately; history must persist.
            if i % 2 == 0 {
                ledger.return_loan(loan.id, UserId(*user)).unwrap();
            }
        }

        let listed: Vec<LoanId> = ledger.list_loans().map(|loan| loan.id).collect();
        prop_assert_eq!(&listed, &created);

        let mut deduped = listed.clone();
        deduped.sort_by_key(|id| id.0);
        deduped.dedup();
        prop_assert_eq!(deduped.len(), created.len());
    }
}

// =============================================================================
// Validation Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Due dates on or before the current date are always rejected
    /// before any mutation.
    #[test]
    fn non_future_due_dates_rejected(
        days_back in 0i64..3650,
    ) {
        let (ledger, inventory, _) = ledger_with_stock(1);
        let due = (now() - chrono::Duration::days(days_back))
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();

        let result = ledger.borrow(UserId(1), ItemId(1), &due);
        prop_assert!(matches!(result, Err(LedgerError::Validation(_))));
        prop_assert_eq!(inventory.available(&ItemId(1)).unwrap(), 1);
    }

    /// Garbage due-date strings never panic and never mutate.
    #[test]
    fn malformed_due_dates_rejected(
        raw in "[a-z0-9/:. -]{0,24}",
    ) {
        prop_assume!(chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d").is_err());

        let (ledger, inventory, _) = ledger_with_stock(1);
        let result = ledger.borrow(UserId(1), ItemId(1), &raw);
        prop_assert!(matches!(result, Err(LedgerError::Validation(_))));
        prop_assert_eq!(inventory.available(&ItemId(1)).unwrap(), 1);
    }
}

// =============================================================================
// Increment Cap Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Increment never raises available above total; at cap it fails
    /// Inconsistent and leaves the counter alone.
    #[test]
    fn increment_respects_cap(
        stock in 1u32..20,
        borrows in 0u32..20,
    ) {
        let inventory = MemoryInventory::new();
        inventory.register(ItemId(1), stock).unwrap();

        let taken = borrows.min(stock);
        for _ in 0..taken {
            inventory.try_decrement(&ItemId(1)).unwrap();
        }

        // Undo everything taken, then one more.
        for _ in 0..taken {
            inventory.increment(&ItemId(1)).unwrap();
        }
        let result = inventory.increment(&ItemId(1));
        prop_assert!(matches!(result, Err(LedgerError::Inconsistent(_))));
        prop_assert_eq!(inventory.available(&ItemId(1)).unwrap(), stock);
    }
}
