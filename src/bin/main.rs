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

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use lending_ledger_rs::{
    InventoryStore, ItemId, Ledger, LoanId, MemoryInventory, MemoryLoanStore, UserId,
};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Lending Ledger - Process lending action CSV files
///
/// Reads stock/borrow/return actions from a CSV file and outputs the
/// resulting loan records to stdout.
#[derive(Parser, Debug)]
#[command(name = "lending-ledger-rs")]
#[command(about = "A lending ledger that processes borrow/return CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with lending actions
    ///
    /// Expected format: action,user,item,loan,due,quantity
    /// Example: cargo run -- actions.csv > loans.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let ledger = match process_actions(BufReader::new(file)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error processing actions: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_loans(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `action, user, item, loan, due, quantity`
#[derive(Debug, serde::Deserialize)]
struct CsvRecord {
    action: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    user: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    item: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    loan: Option<u64>,
    due: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    quantity: Option<u32>,
}

/// A parsed lending action.
#[derive(Debug)]
enum Action {
    /// Register an item's total quantity (catalog-side seeding).
    Stock { item_id: ItemId, quantity: u32 },
    Borrow {
        user_id: UserId,
        item_id: ItemId,
        due: String,
    },
    Return { user_id: UserId, loan_id: LoanId },
}

impl CsvRecord {
    /// Converts a CSV record to an Action.
    ///
    /// Returns `None` for unknown actions or missing required fields.
    fn into_action(self) -> Option<Action> {
        match self.action.to_lowercase().as_str() {
            "stock" => Some(Action::Stock {
                item_id: ItemId(self.item?),
                quantity: self.quantity?,
            }),
            "borrow" => Some(Action::Borrow {
                user_id: UserId(self.user?),
                item_id: ItemId(self.item?),
                due: self.due.filter(|d| !d.is_empty())?,
            }),
            "return" => Some(Action::Return {
                user_id: UserId(self.user?),
                loan_id: LoanId(self.loan?),
            }),
            _ => None,
        }
    }
}

/// Process lending actions from a CSV reader.
///
/// Uses streaming parsing so arbitrarily large action files never load
/// into memory at once. Malformed rows and rejected actions are logged
/// and skipped; processing continues.
///
/// # CSV Format
///
/// Expected columns: `action, user, item, loan, due, quantity`
/// - `action`: stock, borrow, or return
/// - `user`: User ID (borrow/return)
/// - `item`: Item ID (stock/borrow)
/// - `loan`: Loan ID (return)
/// - `due`: Due date, YYYY-MM-DD (borrow)
/// - `quantity`: Total copies (stock)
///
/// # Example
///
/// ```csv
/// action,user,item,loan,due,quantity
/// stock,,1,,,3
/// borrow,7,1,,2999-01-01,
/// return,7,,1,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is
/// invalid. Individual action failures don't stop processing.
pub fn process_actions<R: Read>(reader: R) -> Result<Ledger, csv::Error> {
    let inventory = Arc::new(MemoryInventory::new());
    let ledger = Ledger::new(inventory.clone(), Arc::new(MemoryLoanStore::new()));

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " borrow "
        .flexible(true) // Allow trailing fields to be omitted
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(action) = record.into_action() else {
                    warn!("skipping invalid action record");
                    continue;
                };

                let outcome = match action {
                    Action::Stock { item_id, quantity } => inventory.register(item_id, quantity),
                    Action::Borrow {
                        user_id,
                        item_id,
                        due,
                    } => ledger.borrow(user_id, item_id, &due).map(|_| ()),
                    Action::Return { user_id, loan_id } => {
                        ledger.return_loan(loan_id, user_id).map(|_| ())
                    }
                };

                if let Err(e) = outcome {
                    warn!(error = %e, "skipping rejected action");
                }
            }
            Err(e) => {
                warn!(error = %e, "skipping malformed row");
                continue;
            }
        }
    }

    Ok(ledger)
}

/// Write all loan records to a CSV writer.
///
/// # CSV Format
///
/// Columns: `id, item_id, user_id, borrow_date, due_date, status,
/// return_date`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_loans<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for loan in ledger.list_loans() {
        wtr.serialize(&loan)?;
    }

    wtr.flush()?;
    Ok(())
}
