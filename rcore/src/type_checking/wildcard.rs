//! Identity of wildcard types.
//!
//! A wildcard stands for "the subset of its upper bounds produced by one particular
//! pipeline element". Two wildcards are the same type only if they were produced by the same
//! construction site over the same bounds. Identity is an index into a process-wide arena
//! that maps ids back to their origin and bounds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use lazy_static::lazy_static;

use super::types::TypeTag;

/// Identity of a pipeline element (filter, mapper or step) that can produce wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(u32);

static NEXT_SITE: AtomicU32 = AtomicU32::new(1);

impl SiteId {
    pub fn fresh() -> Self {
        SiteId(NEXT_SITE.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WildcardId(u32);

impl std::fmt::Display for WildcardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct WildcardEntry {
    site: SiteId,
    bounds: Vec<TypeTag>,
}

#[derive(Debug, Default)]
pub struct WildcardRegistry {
    entries: Vec<WildcardEntry>,
    by_origin: HashMap<(SiteId, Vec<TypeTag>), u32>,
    marks: HashMap<String, SiteId>,
}

lazy_static! {
    static ref REGISTRY: Mutex<WildcardRegistry> = Mutex::new(WildcardRegistry::default());
}

fn registry() -> MutexGuard<'static, WildcardRegistry> {
    // the registry holds no invariants a panicking holder could break
    REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl WildcardRegistry {
    /// Id of the wildcard `site` produces over `bounds`, allocating it on first use.
    pub fn intern(site: SiteId, bounds: &[TypeTag]) -> WildcardId {
        let mut reg = registry();
        let mut key_bounds = bounds.to_vec();
        key_bounds.sort();
        key_bounds.dedup();
        if let Some(index) = reg.by_origin.get(&(site, key_bounds.clone())) {
            return WildcardId(*index);
        }
        let index = reg.entries.len() as u32;
        reg.entries.push(WildcardEntry {
            site,
            bounds: key_bounds.clone(),
        });
        reg.by_origin.insert((site, key_bounds), index);
        WildcardId(index)
    }

    pub fn bounds(id: WildcardId) -> Option<Vec<TypeTag>> {
        registry().entries.get(id.0 as usize).map(|e| e.bounds.clone())
    }

    pub fn site(id: WildcardId) -> Option<SiteId> {
        registry().entries.get(id.0 as usize).map(|e| e.site)
    }
}

/// Named construction sites, so a test can refer to the wildcard a marked filter produces.
pub struct MarkLookup;

impl MarkLookup {
    pub fn site(name: &str) -> SiteId {
        let mut reg = registry();
        *reg.marks
            .entry(name.to_string())
            .or_insert_with(SiteId::fresh)
    }

    pub fn lookup(name: &str) -> Option<SiteId> {
        registry().marks.get(name).copied()
    }
}
