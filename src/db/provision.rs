use sqlx::PgPool;

use crate::db::naming::quote_ident;
use crate::db::registry::{PoolRegistry, TenantPool};
use crate::error::{is_duplicate_database, Result, TenantError};

/// Transaction-scoped advisory lock held while creating tables, so that two
/// sessions never race on `CREATE TABLE IF NOT EXISTS` in the same database.
/// Advisory locks are per database, so one key serves every tenant.
const SCHEMA_LOCK_KEY: i64 = 0x6e65_7873_7973;

/// Feature areas that own tables inside a tenant database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Email,
    Calendar,
    Clients,
    Expenditure,
}

impl Feature {
    fn statements(self) -> &'static [&'static str] {
        match self {
            Feature::Email => EMAIL_SCHEMA,
            Feature::Calendar => CALENDAR_SCHEMA,
            Feature::Clients => CLIENTS_SCHEMA,
            Feature::Expenditure => EXPENDITURE_SCHEMA,
        }
    }
}

const CONTROL_SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS companies (
        id           SERIAL PRIMARY KEY,
        company_name VARCHAR(100) UNIQUE,
        created_at   TIMESTAMP DEFAULT NOW()
    )"#,
    // company_name references companies by name, not id; callers look users up by it.
    r#"CREATE TABLE IF NOT EXISTS users (
        id           SERIAL PRIMARY KEY,
        username     VARCHAR(50),
        password     VARCHAR(255),
        email        VARCHAR(255),
        company_name VARCHAR(100) REFERENCES companies(company_name),
        role         VARCHAR(20) DEFAULT 'user'
                     CHECK (role IN ('user', 'admin', 'superadmin')),
        created_at   TIMESTAMP DEFAULT NOW()
    )"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS users_username_company_idx
        ON users (username, company_name)"#,
];

const EMAIL_SCHEMA: &[&str] = &[r#"CREATE TABLE IF NOT EXISTS email_settings (
        id        SERIAL PRIMARY KEY,
        smtp_host VARCHAR(255),
        smtp_port INT,
        imap_host VARCHAR(255),
        imap_port INT,
        email     VARCHAR(255) UNIQUE NOT NULL,
        password  TEXT NOT NULL,
        CHECK (
          (smtp_host IS NOT NULL AND smtp_port IS NOT NULL)
          OR
          (imap_host IS NOT NULL AND imap_port IS NOT NULL)
        )
    )"#];

const CLIENTS_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS clients (
        id         SERIAL PRIMARY KEY,
        firstname  VARCHAR(100) NOT NULL,
        surname    VARCHAR(100),
        email      VARCHAR(255),
        phone      VARCHAR(50),
        created_at TIMESTAMP DEFAULT NOW()
    )"#;

const CLIENTS_SCHEMA: &[&str] = &[
    CLIENTS_TABLE,
    "CREATE INDEX IF NOT EXISTS clients_firstname_idx ON clients (firstname)",
];

// Calendar entries join to clients, so the calendar feature creates that table too.
const CALENDAR_SCHEMA: &[&str] = &[
    CLIENTS_TABLE,
    r#"CREATE TABLE IF NOT EXISTS calendar_status (
        id          SERIAL PRIMARY KEY,
        status_desc VARCHAR(100) NOT NULL UNIQUE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS calendar (
        id         SERIAL PRIMARY KEY,
        agenda     TEXT NOT NULL,
        time       TIME NOT NULL DEFAULT '00:00',
        date       DATE NOT NULL,
        status_id  INT REFERENCES calendar_status(id),
        client_id  INT REFERENCES clients(id) ON DELETE SET NULL,
        created_at TIMESTAMP DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS calendar_date_idx ON calendar (date, time)",
];

const EXPENDITURE_SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS expense_category (
        id            SERIAL PRIMARY KEY,
        category_name VARCHAR(100) NOT NULL UNIQUE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS expenditure (
        id             SERIAL PRIMARY KEY,
        date           DATE NOT NULL DEFAULT CURRENT_DATE,
        supplier       VARCHAR(255),
        category_id    INT REFERENCES expense_category(id),
        category_name  VARCHAR(100),
        description    TEXT NOT NULL,
        amount         DOUBLE PRECISION NOT NULL,
        vat_amount     DOUBLE PRECISION NOT NULL DEFAULT 0,
        payment_method VARCHAR(50),
        receipt_no     VARCHAR(100),
        scan           TEXT,
        notes          TEXT,
        created_at     TIMESTAMP DEFAULT NOW()
    )"#,
];

/// Creates `database` through the system pool unless it already exists.
///
/// Returns `true` when this call created it. Losing a creation race to a
/// concurrent caller counts as success.
pub async fn ensure_database(system: &PgPool, database: &str) -> Result<bool> {
    match sqlx::raw_sql(&format!("CREATE DATABASE {}", quote_ident(database)))
        .execute(system)
        .await
    {
        Ok(_) => {
            tracing::info!("Created database {database}");
            Ok(true)
        }
        Err(e) if is_duplicate_database(&e) => {
            tracing::info!("Database {database} already exists");
            Ok(false)
        }
        Err(e) => {
            tracing::warn!("Could not create database {database}: {e}");
            Err(TenantError::from_provisioning(database, e))
        }
    }
}

/// Records `company_name` in the control-plane directory. Returns `true` when a
/// new row was inserted.
pub async fn ensure_directory_entry(registry: &PoolRegistry, company_name: &str) -> Result<bool> {
    let control_db = &registry.settings().control_database;
    let inserted = sqlx::query(
        "INSERT INTO companies (company_name) VALUES ($1) ON CONFLICT (company_name) DO NOTHING",
    )
    .bind(company_name)
    .execute(registry.control())
    .await
    .map_err(|e| TenantError::from_provisioning(control_db, e))?
    .rows_affected()
        == 1;

    if inserted {
        tracing::info!("Registered company {company_name:?}");
    }
    Ok(inserted)
}

/// Ensures the control-plane tables (`companies`, `users`) exist.
pub async fn ensure_control_schema(registry: &PoolRegistry) -> Result<()> {
    run_schema(
        registry.control(),
        &registry.settings().control_database,
        CONTROL_SCHEMA,
    )
    .await
}

/// Ensures the tables owned by `feature` exist in the tenant's database.
///
/// Runs the DDL at most once per pool on success. A failure leaves nothing
/// recorded, so the next call retries.
pub async fn ensure_feature_schema(tenant: &TenantPool, feature: Feature) -> Result<()> {
    if tenant.is_ready(feature) {
        return Ok(());
    }
    if let Err(err) = run_schema(tenant.pool(), tenant.name().as_str(), feature.statements()).await {
        tenant.forget_if_missing(&err);
        return Err(err);
    }
    tenant.mark_ready(feature);
    tracing::debug!("Ensured {feature:?} schema on {}", tenant.name());
    Ok(())
}

async fn run_schema(pool: &PgPool, database: &str, statements: &[&str]) -> Result<()> {
    // Reaching the database at all is a routing concern: a missing database is
    // TenantNotFound here, not a provisioning failure.
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| TenantError::from_query(database, e))?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *tx)
        .await
        .map_err(|e| TenantError::from_provisioning(database, e))?;

    for statement in statements {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| TenantError::from_provisioning(database, e))?;
    }

    tx.commit()
        .await
        .map_err(|e| TenantError::from_provisioning(database, e))?;
    Ok(())
}
