pub mod naming;
pub mod provision;
pub mod registry;

pub use naming::{normalize, DatabaseName};
pub use provision::Feature;
pub use registry::{PoolRegistry, TenantPool};

use crate::error::Result;

/// Makes sure the control-plane database and its tables exist.
/// Idempotent, so it runs on every startup.
pub async fn bootstrap(registry: &PoolRegistry) -> Result<()> {
    let control_db = registry.settings().control_database.clone();
    provision::ensure_database(registry.system(), &control_db).await?;
    provision::ensure_control_schema(registry).await?;
    tracing::info!("Control database {control_db} ready");
    Ok(())
}
