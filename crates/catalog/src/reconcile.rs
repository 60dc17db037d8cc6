// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Merging a live observation into a persisted record set
//!
//! Records are matched by identity. Everything previously known is kept:
//! a record that was not observed this cycle is marked stale, never removed.

use crate::codec::MISSING_SENTINEL;
use crate::records::{Asset, Record};
use diagnostics::*;
use std::collections::HashMap;

/// Result of one reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<T> {
    pub records: Vec<T>,
    /// Observed records with no existing counterpart
    pub inserted: usize,
    /// Existing records that were observed again
    pub updated: usize,
    /// Records left stale after the merge
    pub stale: usize,
}

/// Merge `observed` into `existing`
///
/// Existing records keep their positions and new ones are appended in
/// observation order. Repeated identities in `observed` collapse to the last
/// one; repeated identities in `existing` collapse to the first. Stored
/// records whose identity was lost ([`MISSING_SENTINEL`]) match nothing and
/// are all kept, stale.
pub fn reconcile<T: Asset>(existing: Vec<T>, observed: Vec<T>) -> Reconciled<T> {
    let mut records: Vec<T> = Vec::with_capacity(existing.len() + observed.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(records.capacity());

    for mut record in existing {
        if record.identity() == MISSING_SENTINEL {
            record.set_stale(true);
            records.push(record);
            continue;
        }
        if index.contains_key(record.identity()) {
            let identity = record.identity();
            let asset_type = T::ASSET_TYPE;
            warn!(
                "dropping duplicate stored {asset_type} record {identity}",
                asset_type: asset_type,
                identity: identity
            );
            continue;
        }
        record.set_stale(true);
        let _ = index.insert(record.identity().to_string(), records.len());
        records.push(record);
    }

    let known = records.len();
    let mut seen = vec![false; known];
    let mut inserted = 0;
    let mut updated = 0;

    for mut record in observed {
        record.set_stale(false);
        match index.get(record.identity()).copied() {
            Some(position) => {
                if position < known && !seen[position] {
                    seen[position] = true;
                    updated += 1;
                }
                records[position] = record;
            }
            None => {
                let _ = index.insert(record.identity().to_string(), records.len());
                records.push(record);
                inserted += 1;
            }
        }
    }

    let stale = records.iter().filter(|record| record.is_stale()).count();
    Reconciled {
        records,
        inserted,
        updated,
        stale,
    }
}

/// Whether [`upsert`] added or replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Replaced,
    Unchanged,
}

/// Put `record` in place of the record with the same identity, or append it
pub fn upsert<T: Record + PartialEq>(records: &mut Vec<T>, record: T) -> Upserted {
    match records
        .iter_mut()
        .find(|existing| existing.identity() == record.identity())
    {
        Some(existing) if *existing == record => Upserted::Unchanged,
        Some(existing) => {
            *existing = record;
            Upserted::Replaced
        }
        None => {
            records.push(record);
            Upserted::Inserted
        }
    }
}
