//! Process-wide cache of comma-joined schema field lists.
//!
//! Entries are computed on first use of a record type and never evicted.
//! Two callers may compute the same entry concurrently; the first insert
//! wins and both get the same shared string back.

use crate::schema::Record;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

static FIELD_LISTS: Lazy<RwLock<HashMap<TypeId, Arc<str>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Field list for a record type, in schema order.
pub fn field_list<R: Record>() -> Arc<str> {
    let key = TypeId::of::<R>();
    if let Ok(cache) = FIELD_LISTS.read() {
        if let Some(cached) = cache.get(&key) {
            return Arc::clone(cached);
        }
    }

    let joined: Arc<str> = R::schema()
        .field_names()
        .collect::<Vec<_>>()
        .join(",")
        .into();
    match FIELD_LISTS.write() {
        Ok(mut cache) => Arc::clone(cache.entry(key).or_insert(joined)),
        Err(_) => joined,
    }
}
