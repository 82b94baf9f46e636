//! Schema synchronisation during a version upgrade
//!
//! Declared stores and indexes are created when missing. An index whose
//! uniqueness or key path changed is dropped and rebuilt. Stores and indexes
//! the configuration does not declare are left alone.

use std::collections::HashSet;

use tracing::info;

use crate::schema::Catalog;
use crate::storage::{StorageResult, UpgradeTransaction};

/// Brings the database's stores and indexes in line with `catalog`
pub fn sync_schema(tx: &mut dyn UpgradeTransaction, catalog: &Catalog) -> StorageResult<()> {
    let existing: HashSet<String> = tx.store_names().into_iter().collect();

    for descriptor in catalog.iter() {
        let store = descriptor.store_name.as_str();
        if !existing.contains(store) {
            info!(store, primary_key = %descriptor.primary_key.field, "creating store");
            tx.create_store(store, &descriptor.primary_key)?;
        }

        let current = tx.indexes(store)?;
        for index in &descriptor.indexes {
            match current.iter().find(|c| c.name == index.name) {
                Some(c) if c.unique == index.unique && c.key_path == index.key_path => {}
                Some(_) => {
                    info!(store, index = %index.name, "rebuilding changed index");
                    tx.delete_index(store, &index.name)?;
                    tx.create_index(store, index)?;
                }
                None => {
                    info!(store, index = %index.name, "creating index");
                    tx.create_index(store, index)?;
                }
            }
        }
    }

    Ok(())
}
