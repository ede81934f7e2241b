use std::sync::{Arc, Weak};

use dashmap::{DashMap, DashSet};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseSettings;
use crate::db::naming::DatabaseName;
use crate::db::provision::Feature;
use crate::error::TenantError;

const CONTROL_MAX_CONNECTIONS: u32 = 20;
const SYSTEM_MAX_CONNECTIONS: u32 = 2;

type TenantMap = DashMap<DatabaseName, Arc<TenantPool>>;

/// A tenant's connection pool plus the per-feature tables already ensured on it.
#[derive(Debug)]
pub struct TenantPool {
    name: DatabaseName,
    pool: PgPool,
    ready: DashSet<Feature>,
    /// Map this pool is cached in, for eviction once the database turns out
    /// not to exist.
    registry: Weak<TenantMap>,
}

impl TenantPool {
    pub fn name(&self) -> &DatabaseName {
        &self.name
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Classifies a failed query issued through this pool.
    pub fn query_error(&self, err: sqlx::Error) -> TenantError {
        let err = TenantError::from_query(self.name.as_str(), err);
        self.forget_if_missing(&err);
        err
    }

    /// Drops this pool from the registry when `err` says its database does not
    /// exist, so unknown names do not accumulate. Only this exact instance is
    /// removed; a newer pool cached under the same name is left alone.
    pub(crate) fn forget_if_missing(&self, err: &TenantError) {
        if !matches!(err, TenantError::TenantNotFound(_)) {
            return;
        }
        let Some(tenants) = self.registry.upgrade() else {
            return;
        };
        let removed = tenants
            .remove_if(&self.name, |_, cached| std::ptr::eq(Arc::as_ptr(cached), self))
            .is_some();
        if !removed {
            return;
        }

        tracing::debug!("Evicted pool for missing database {}", self.name);
        let pool = self.pool.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move { pool.close().await });
        }
    }

    pub fn is_ready(&self, feature: Feature) -> bool {
        self.ready.contains(&feature)
    }

    pub(crate) fn mark_ready(&self, feature: Feature) {
        self.ready.insert(feature);
    }
}

/// Owns every pool in the process: one per tenant database, plus the control
/// and system singletons.
///
/// Pools connect lazily, so building one never touches the network; connect
/// errors surface on the first query.
pub struct PoolRegistry {
    settings: DatabaseSettings,
    control: PgPool,
    system: PgPool,
    tenants: Arc<TenantMap>,
}

impl PoolRegistry {
    pub fn new(settings: DatabaseSettings) -> Self {
        let control = pool_options(&settings, CONTROL_MAX_CONNECTIONS)
            .connect_lazy_with(settings.connect_options(&settings.control_database));
        let system = pool_options(&settings, SYSTEM_MAX_CONNECTIONS)
            .connect_lazy_with(settings.connect_options(&settings.system_database));
        Self {
            settings,
            control,
            system,
            tenants: Arc::new(DashMap::new()),
        }
    }

    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    /// Pool on the control-plane database (`companies`, `users`).
    pub fn control(&self) -> &PgPool {
        &self.control
    }

    /// Pool on the administrative database. Only used for `CREATE DATABASE`.
    pub fn system(&self) -> &PgPool {
        &self.system
    }

    /// Returns the cached pool for `name`, building it on first access.
    ///
    /// Insert-if-absent happens under the map's shard lock, so concurrent first
    /// accesses for one name all receive the same `Arc`.
    pub fn get_or_create_pool(&self, name: &DatabaseName) -> Arc<TenantPool> {
        if let Some(existing) = self.tenants.get(name) {
            return existing.value().clone();
        }

        self.tenants
            .entry(name.clone())
            .or_insert_with(|| {
                tracing::debug!("Opening pool for {name}");
                let pool = pool_options(&self.settings, self.settings.max_connections)
                    .connect_lazy_with(self.settings.connect_options(name.as_str()));
                Arc::new(TenantPool {
                    name: name.clone(),
                    pool,
                    ready: DashSet::new(),
                    registry: Arc::downgrade(&self.tenants),
                })
            })
            .value()
            .clone()
    }

    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    pub fn cached_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tenants
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        names.sort();
        names
    }
}

fn pool_options(settings: &DatabaseSettings, max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(settings.acquire_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::naming::normalize;

    #[tokio::test]
    async fn same_name_returns_same_instance() {
        let registry = PoolRegistry::new(DatabaseSettings::unreachable());
        let name = normalize("Acme").unwrap();
        let a = registry.get_or_create_pool(&name);
        let b = registry.get_or_create_pool(&name);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.tenant_count(), 1);
    }

    #[tokio::test]
    async fn colliding_identifiers_share_a_pool() {
        let registry = PoolRegistry::new(DatabaseSettings::unreachable());
        let a = registry.get_or_create_pool(&normalize("MBS Tech").unwrap());
        let b = registry.get_or_create_pool(&normalize("mbs    tech").unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.cached_names(), vec!["company_mbs_tech".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_first_access_builds_one_pool() {
        let registry = Arc::new(PoolRegistry::new(DatabaseSettings::unreachable()));
        let name = normalize("Acme").unwrap();

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let registry = registry.clone();
                let name = name.clone();
                tokio::spawn(async move { registry.get_or_create_pool(&name) })
            })
            .collect();

        let mut pools = Vec::new();
        for handle in handles {
            pools.push(handle.await.unwrap());
        }

        let first = &pools[0];
        assert!(pools.iter().all(|p| Arc::ptr_eq(p, first)));
        assert_eq!(registry.tenant_count(), 1);
    }

    #[tokio::test]
    async fn missing_database_evicts_its_pool() {
        let registry = PoolRegistry::new(DatabaseSettings::unreachable());
        let name = normalize("NeverCreated").unwrap();
        let stale = registry.get_or_create_pool(&name);

        let err = TenantError::TenantNotFound(name.to_string());
        stale.forget_if_missing(&err);
        assert_eq!(registry.tenant_count(), 0);

        let fresh = registry.get_or_create_pool(&name);
        assert!(!Arc::ptr_eq(&stale, &fresh));

        // A stale handle must not evict the pool that replaced it.
        stale.forget_if_missing(&err);
        assert_eq!(registry.tenant_count(), 1);
        assert!(Arc::ptr_eq(&fresh, &registry.get_or_create_pool(&name)));
    }

    #[tokio::test]
    async fn unreachable_server_keeps_the_pool_cached() {
        let registry = PoolRegistry::new(DatabaseSettings::unreachable());
        let pool = registry.get_or_create_pool(&normalize("Acme").unwrap());
        let err = pool.query_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, TenantError::TenantUnreachable { .. }));
        assert_eq!(registry.tenant_count(), 1);
    }

    #[tokio::test]
    async fn many_unknown_names_do_not_accumulate() {
        let registry = PoolRegistry::new(DatabaseSettings::unreachable());
        for i in 0..500 {
            let name = normalize(&format!("junk {i}")).unwrap();
            let pool = registry.get_or_create_pool(&name);
            pool.forget_if_missing(&TenantError::TenantNotFound(name.to_string()));
        }
        assert_eq!(registry.tenant_count(), 0);
    }

    #[tokio::test]
    async fn readiness_is_tracked_per_feature() {
        let registry = PoolRegistry::new(DatabaseSettings::unreachable());
        let pool = registry.get_or_create_pool(&normalize("Acme").unwrap());
        assert!(!pool.is_ready(Feature::Calendar));
        pool.mark_ready(Feature::Calendar);
        assert!(pool.is_ready(Feature::Calendar));
        assert!(!pool.is_ready(Feature::Email));
    }
}
