//! Reference Cache (C1) — amortizes reference-table lookups across a run.
//!
//! Scoped to a single logical transaction/session the way the teacher's
//! `DieselDbContext` is scoped per worker: callers must not share a cache
//! across concurrent transactions (see spec §5 "Shared state").

use std::collections::HashMap;

use crate::models::{Destination, Job, Material, Source, TicketType, Vendor};

/// In-memory, case-sensitive exact-match cache of reference rows by name.
///
/// Populated lazily on first miss through the supplied loader closures, or
/// eagerly via [`ReferenceCache::preload_all`]. Never shared across
/// concurrent sessions — each batch worker owns its own instance.
#[derive(Default)]
pub struct ReferenceCache {
    jobs: HashMap<String, Job>,
    materials: HashMap<String, Material>,
    sources: HashMap<String, Source>,
    destinations: HashMap<String, Destination>,
    vendors: HashMap<String, Vendor>,
    ticket_types: HashMap<String, TicketType>,
}

/// Generates a `get_<entity>_by_name` accessor that checks the cache first
/// and otherwise calls the async loader exactly once, storing the result.
macro_rules! cached_lookup {
    ($fn_name:ident, $map:ident, $entity:ty) => {
        /// Look up a reference row by exact (case-sensitive) name, calling
        /// `load` on a cache miss and memoizing the result.
        pub async fn $fn_name<F, Fut, E>(
            &mut self,
            name: &str,
            load: F,
        ) -> Result<Option<$entity>, E>
        where
            F: FnOnce(&str) -> Fut,
            Fut: std::future::Future<Output = Result<Option<$entity>, E>>,
        {
            if let Some(hit) = self.$map.get(name) {
                return Ok(Some(hit.clone()));
            }
            match load(name).await? {
                Some(entity) => {
                    self.$map.insert(name.to_string(), entity.clone());
                    Ok(Some(entity))
                }
                None => Ok(None),
            }
        }
    };
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    cached_lookup!(get_job_by_name, jobs, Job);
    cached_lookup!(get_material_by_name, materials, Material);
    cached_lookup!(get_source_by_name, sources, Source);
    cached_lookup!(get_destination_by_name, destinations, Destination);
    cached_lookup!(get_vendor_by_name, vendors, Vendor);
    cached_lookup!(get_ticket_type_by_name, ticket_types, TicketType);

    /// Seed the cache directly, e.g. after a `preload_all()` bulk query.
    pub fn preload_jobs(&mut self, rows: impl IntoIterator<Item = Job>) {
        for row in rows {
            self.jobs.insert(row.name.clone(), row);
        }
    }
    pub fn preload_materials(&mut self, rows: impl IntoIterator<Item = Material>) {
        for row in rows {
            self.materials.insert(row.name.clone(), row);
        }
    }
    pub fn preload_sources(&mut self, rows: impl IntoIterator<Item = Source>) {
        for row in rows {
            self.sources.insert(row.name.clone(), row);
        }
    }
    pub fn preload_destinations(&mut self, rows: impl IntoIterator<Item = Destination>) {
        for row in rows {
            self.destinations.insert(row.name.clone(), row);
        }
    }
    pub fn preload_vendors(&mut self, rows: impl IntoIterator<Item = Vendor>) {
        for row in rows {
            self.vendors.insert(row.name.clone(), row);
        }
    }
    pub fn preload_ticket_types(&mut self, rows: impl IntoIterator<Item = TicketType>) {
        for row in rows {
            self.ticket_types.insert(row.name.as_str().to_string(), row);
        }
    }

    /// Invalidate everything (spec §4.1 `clear()`).
    pub fn clear(&mut self) {
        self.jobs.clear();
        self.materials.clear();
        self.sources.clear();
        self.destinations.clear();
        self.vendors.clear();
        self.ticket_types.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_job() -> Job {
        Job {
            id: 1,
            code: "24-105".into(),
            name: "Lewisville Site".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
        }
    }

    #[tokio::test]
    async fn cache_hit_never_calls_loader_again() {
        let mut cache = ReferenceCache::new();
        let calls = AtomicUsize::new(0);

        let first: Result<Option<Job>, ()> = cache
            .get_job_by_name("Lewisville Site", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Some(sample_job())) }
            })
            .await;
        assert!(first.unwrap().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second: Result<Option<Job>, ()> = cache
            .get_job_by_name("Lewisville Site", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Some(sample_job())) }
            })
            .await;
        assert!(second.unwrap().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1, "second lookup must be a cache hit");
    }

    #[tokio::test]
    async fn clear_forces_reload() {
        let mut cache = ReferenceCache::new();
        cache.preload_jobs([sample_job()]);

        let hit: Result<Option<Job>, ()> = cache
            .get_job_by_name("Lewisville Site", |_| async { Ok(None) })
            .await;
        assert!(hit.unwrap().is_some(), "preloaded entry should be found without loader call");

        cache.clear();
        let miss: Result<Option<Job>, ()> = cache
            .get_job_by_name("Lewisville Site", |_| async { Ok(None) })
            .await;
        assert!(miss.unwrap().is_none());
    }
}
