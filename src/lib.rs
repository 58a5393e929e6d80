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

//! # Lending Ledger
//!
//! This library tracks a catalog of lendable items and the lifecycle of
//! loans against them: borrowing decrements an item's available quantity
//! through a guarded compare-and-decrement, and returning transitions the
//! loan exactly once through a compare-and-set before crediting stock
//! back.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Orchestrator implementing borrow and return with
//!   cross-entity consistency
//! - [`InventoryStore`] / [`MemoryInventory`]: Per-item stock counters
//!   with atomic guarded mutations
//! - [`LoanStore`] / [`MemoryLoanStore`]: Append-only loan records with a
//!   conditional status update
//! - [`LedgerError`]: Typed failures for every lending outcome
//!
//! ## Example
//!
//! ```
//! use lending_ledger_rs::{
//!     InventoryStore, ItemId, Ledger, LoanStatus, MemoryInventory, MemoryLoanStore, UserId,
//! };
//! use std::sync::Arc;
//!
//! let inventory = Arc::new(MemoryInventory::new());
//! inventory.register(ItemId(1), 3).unwrap();
//!
//! let ledger = Ledger::new(inventory, Arc::new(MemoryLoanStore::new()));
//!
//! let loan = ledger.borrow(UserId(7), ItemId(1), "2999-01-01").unwrap();
//! assert_eq!(loan.status, LoanStatus::Borrowed);
//!
//! let returned = ledger.return_loan(loan.id, UserId(7)).unwrap();
//! assert_eq!(returned.status, LoanStatus::Returned);
//! ```
//!
//! ## Thread Safety
//!
//! The ledger is stateless between calls and safe under true parallel
//! invocation. Atomicity is confined to the stores' three guarded
//! primitives; no lock spans a whole borrow or return call.

pub mod base;
pub mod catalog;
pub mod clock;
pub mod error;
mod inventory;
mod ledger;
pub mod loan;
mod loan_store;

pub use base::{ItemId, LoanId, UserId};
pub use catalog::{Catalog, ItemMetadata, MemoryCatalog};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::LedgerError;
pub use inventory::{InventoryStore, MemoryInventory};
pub use ledger::Ledger;
pub use loan::{Loan, LoanStatus, LoanView, NewLoan};
pub use loan_store::{LoanStore, MemoryLoanStore};
