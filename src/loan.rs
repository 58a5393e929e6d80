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

//! Loan records and their status state machine.
//!
//! A loan follows a one-way state machine:
//! - [`Borrowed`] → [`Returned`] (returned on time)
//! - [`Borrowed`] → [`LateReturned`] (returned past the due date)
//!
//! Both returned variants are terminal; no transition leaves them.
//!
//! [`Borrowed`]: LoanStatus::Borrowed
//! [`Returned`]: LoanStatus::Returned
//! [`LateReturned`]: LoanStatus::LateReturned

use crate::base::{ItemId, LoanId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a loan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Borrowed,
    Returned,
    LateReturned,
}

impl LoanStatus {
    /// A terminal status admits no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Returned | Self::LateReturned)
    }
}

/// A stored loan record: one unit of one item lent to one user.
///
/// Loans are historical evidence of stock movement and are never deleted.
/// `return_date` is set if and only if the status is a returned variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub id: LoanId,
    pub item_id: ItemId,
    pub user_id: UserId,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub status: LoanStatus,
    pub return_date: Option<DateTime<Utc>>,
}

/// Fields of a loan that exist before the store assigns an identifier.
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub item_id: ItemId,
    pub user_id: UserId,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
}

/// Public view of a loan, as returned to calling collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoanView {
    pub id: LoanId,
    pub item_id: ItemId,
    pub user_id: UserId,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub status: LoanStatus,
    pub return_date: Option<DateTime<Utc>>,
}

impl From<Loan> for LoanView {
    fn from(loan: Loan) -> Self {
        LoanView {
            id: loan.id,
            item_id: loan.item_id,
            user_id: loan.user_id,
            borrow_date: loan.borrow_date,
            due_date: loan.due_date,
            status: loan.status,
            return_date: loan.return_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!LoanStatus::Borrowed.is_terminal());
        assert!(LoanStatus::Returned.is_terminal());
        assert!(LoanStatus::LateReturned.is_terminal());
    }

    #[test]
    fn status_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&LoanStatus::Borrowed).unwrap(),
            "\"borrowed\""
        );
        assert_eq!(
            serde_json::to_string(&LoanStatus::Returned).unwrap(),
            "\"returned\""
        );
        assert_eq!(
            serde_json::to_string(&LoanStatus::LateReturned).unwrap(),
            "\"late_returned\""
        );
    }

    #[test]
    fn view_preserves_loan_fields() {
        let borrow_date = "2030-01-01T09:30:00Z".parse::<DateTime<Utc>>().unwrap();
        let loan = Loan {
            id: LoanId(7),
            item_id: ItemId(2),
            user_id: UserId(3),
            borrow_date,
            due_date: NaiveDate::from_ymd_opt(2030, 2, 1).unwrap(),
            status: LoanStatus::Borrowed,
            return_date: None,
        };

        let view = LoanView::from(loan.clone());
        assert_eq!(view.id, loan.id);
        assert_eq!(view.item_id, loan.item_id);
        assert_eq!(view.user_id, loan.user_id);
        assert_eq!(view.borrow_date, loan.borrow_date);
        assert_eq!(view.due_date, loan.due_date);
        assert_eq!(view.status, LoanStatus::Borrowed);
        assert!(view.return_date.is_none());
    }
}
