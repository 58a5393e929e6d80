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

//! Catalog collaborator interface.
//!
//! Item metadata (title, author, ISBN) is owned by an external catalog
//! component; the ledger only consults it for existence checks before
//! touching inventory. Validation and persistence of metadata are out of
//! scope here.

use crate::base::ItemId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Descriptive metadata for a catalog item, opaque to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemMetadata {
    pub id: ItemId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: i32,
}

/// External catalog consumed by the ledger.
pub trait Catalog: Send + Sync {
    fn item_exists(&self, item_id: &ItemId) -> bool;

    fn get_item(&self, item_id: &ItemId) -> Option<ItemMetadata>;
}

/// In-memory catalog, sufficient for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: DashMap<ItemId, ItemMetadata>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    pub fn insert(&self, metadata: ItemMetadata) {
        self.items.insert(metadata.id, metadata);
    }
}

impl Catalog for MemoryCatalog {
    fn item_exists(&self, item_id: &ItemId) -> bool {
        self.items.contains_key(item_id)
    }

    fn get_item(&self, item_id: &ItemId) -> Option<ItemMetadata> {
        self.items.get(item_id).map(|entry| entry.value().clone())
    }
}
