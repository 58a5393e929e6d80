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

//! Error types for lending operations.

use thiserror::Error;

/// Lending ledger errors.
///
/// Variants up to [`Conflict`](LedgerError::Conflict) are rejected before
/// or instead of any mutation. [`WriteError`](LedgerError::WriteError)
/// means the whole call is safe to retry once compensation has run.
/// [`Inconsistent`](LedgerError::Inconsistent) is a detected invariant
/// violation after a successful inventory mutation and must reach an
/// operator channel rather than being absorbed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or illegal input, e.g. a non-future due date
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced item does not exist
    #[error("item not found")]
    ItemNotFound,

    /// Referenced loan does not exist
    #[error("loan not found")]
    LoanNotFound,

    /// Guarded decrement failed: no available copies
    #[error("item out of stock")]
    OutOfStock,

    /// Caller does not own the referenced loan
    #[error("loan belongs to another user")]
    Forbidden,

    /// Optimistic-concurrency loss: the loan already left the Borrowed
    /// state (a concurrent return won, or it was returned earlier)
    #[error("loan already returned")]
    Conflict,

    /// Transient persistence failure
    #[error("store write failed: {0}")]
    WriteError(String),

    /// Invariant violation requiring operator remediation
    #[error("inventory inconsistent: {0}")]
    Inconsistent(String),
}

#[cfg(test)]
mod tests {
    use super::LedgerError;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            LedgerError::Validation("due date must be in the future".into()).to_string(),
            "validation failed: due date must be in the future"
        );
        assert_eq!(LedgerError::ItemNotFound.to_string(), "item not found");
        assert_eq!(LedgerError::LoanNotFound.to_string(), "loan not found");
        assert_eq!(LedgerError::OutOfStock.to_string(), "item out of stock");
        assert_eq!(
            LedgerError::Forbidden.to_string(),
            "loan belongs to another user"
        );
        assert_eq!(LedgerError::Conflict.to_string(), "loan already returned");
        assert_eq!(
            LedgerError::WriteError("disk full".into()).to_string(),
            "store write failed: disk full"
        );
        assert_eq!(
            LedgerError::Inconsistent("increment would exceed total".into()).to_string(),
            "inventory inconsistent: increment would exceed total"
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = LedgerError::OutOfStock;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
