use std::sync::Arc;

use crate::{
    db::{
        naming::{normalize, DatabaseName},
        provision,
        registry::{PoolRegistry, TenantPool},
    },
    error::{Result, TenantError},
    models::user::UserRole,
};

/// What a call to [`TenantRouter::provision_new_tenant`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub database: DatabaseName,
    pub database_created: bool,
    pub directory_created: bool,
}

/// Single entry point feature code uses to reach a tenant's database.
#[derive(Clone)]
pub struct TenantRouter {
    registry: Arc<PoolRegistry>,
}

impl TenantRouter {
    pub fn new(registry: Arc<PoolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    /// Maps a request-supplied company identifier to its pool.
    ///
    /// Never provisions. Queries against a tenant that was never created fail
    /// later with [`TenantError::TenantNotFound`].
    pub fn resolve_tenant(&self, raw_identifier: &str) -> Result<Arc<TenantPool>> {
        let canonical = normalize(raw_identifier)?;
        Ok(self.registry.get_or_create_pool(&canonical))
    }

    /// Creates the tenant's database and directory entry. Only superadmins may
    /// call this; every step is idempotent, so repeating it is harmless.
    pub async fn provision_new_tenant(
        &self,
        company_name: &str,
        requesting_role: &UserRole,
    ) -> Result<ProvisionOutcome> {
        if *requesting_role != UserRole::SuperAdmin {
            return Err(TenantError::Forbidden(
                "Only Superadmin can create companies".into(),
            ));
        }

        let canonical = normalize(company_name)?;
        let database_created =
            provision::ensure_database(self.registry.system(), canonical.as_str()).await?;
        self.warn_on_alias(company_name, &canonical).await;
        let directory_created = provision::ensure_directory_entry(&self.registry, company_name).await?;
        provision::ensure_control_schema(&self.registry).await?;

        self.registry.get_or_create_pool(&canonical);
        tracing::info!("Company {company_name:?} active on {canonical}");

        Ok(ProvisionOutcome {
            database: canonical,
            database_created,
            directory_created,
        })
    }

    /// Logs when another directory entry already routes to the same database,
    /// e.g. "MBS Tech" next to "MBS  Tech".
    async fn warn_on_alias(&self, company_name: &str, canonical: &DatabaseName) {
        let others: Vec<String> = match sqlx::query_scalar(
            "SELECT company_name FROM companies WHERE company_name IS NOT NULL AND company_name <> $1",
        )
        .bind(company_name)
        .fetch_all(self.registry.control())
        .await
        {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("Skipping alias check for {company_name:?}: {e}");
                return;
            }
        };

        for other in others {
            if normalize(&other).ok().as_ref() == Some(canonical) {
                tracing::warn!(
                    "Company {company_name:?} shares database {canonical} with existing company {other:?}"
                );
            }
        }
    }
}
