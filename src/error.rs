use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use thiserror::Error;

/// PostgreSQL SQLSTATE codes the tenancy layer reacts to.
pub mod sqlstate {
    /// `invalid_catalog_name`: the target database does not exist.
    pub const INVALID_CATALOG_NAME: &str = "3D000";
    /// `duplicate_database`: `CREATE DATABASE` lost to an existing database.
    pub const DUPLICATE_DATABASE: &str = "42P04";
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    /// `cannot_connect_now`: server is starting up or shutting down.
    pub const CANNOT_CONNECT_NOW: &str = "57P03";
    /// Class 08 covers every connection exception.
    pub const CONNECTION_EXCEPTION_CLASS: &str = "08";
}

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("invalid tenant identifier {0:?}")]
    InvalidTenantIdentifier(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("tenant database {0} does not exist")]
    TenantNotFound(String),

    #[error("provisioning {database} failed: {source}")]
    ProvisioningFailed {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("tenant database {database} is unreachable: {source}")]
    TenantUnreachable {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("query against {database} failed: {source}")]
    Database {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

pub type Result<T, E = TenantError> = std::result::Result<T, E>;

impl TenantError {
    /// Classifies an error raised by a query issued against `database`.
    pub fn from_query(database: &str, err: sqlx::Error) -> Self {
        if is_connectivity(&err) {
            return TenantError::TenantUnreachable { database: database.to_string(), source: err };
        }
        if sqlstate_of(&err).as_deref() == Some(sqlstate::INVALID_CATALOG_NAME) {
            return TenantError::TenantNotFound(database.to_string());
        }
        TenantError::Database { database: database.to_string(), source: err }
    }

    /// Classifies an error raised while creating a database or its schema.
    /// Connectivity failures stay `TenantUnreachable`; everything else is fatal.
    pub fn from_provisioning(database: &str, err: sqlx::Error) -> Self {
        if is_connectivity(&err) {
            return TenantError::TenantUnreachable { database: database.to_string(), source: err };
        }
        TenantError::ProvisioningFailed { database: database.to_string(), source: err }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            TenantError::InvalidTenantIdentifier(_) => StatusCode::BAD_REQUEST,
            TenantError::Forbidden(_) => StatusCode::FORBIDDEN,
            TenantError::TenantNotFound(_) => StatusCode::NOT_FOUND,
            TenantError::TenantUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            TenantError::ProvisioningFailed { .. }
            | TenantError::Database { .. }
            | TenantError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller. Driver errors never leak past this.
    pub fn public_message(&self) -> String {
        match self {
            TenantError::InvalidTenantIdentifier(_) => "Invalid company identifier".into(),
            TenantError::Forbidden(reason) => format!("Forbidden: {reason}"),
            TenantError::TenantNotFound(_) => "Unknown company".into(),
            TenantError::TenantUnreachable { .. } => "Company database is unreachable".into(),
            TenantError::ProvisioningFailed { .. } => "Error creating company".into(),
            TenantError::Database { .. } => "Database error".into(),
            TenantError::PasswordHash(_) => "Server error".into(),
        }
    }
}

impl From<TenantError> for (StatusCode, Json<Value>) {
    fn from(err: TenantError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!("{err}");
        } else {
            tracing::debug!("{err}");
        }
        (status, Json(json!({ "success": false, "message": err.public_message() })))
    }
}

/// SQLSTATE of a database-side error, if the error came from the server.
pub fn sqlstate_of(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// True when the error means the server could not be reached or never answered
/// within the pool's acquire timeout.
pub fn is_connectivity(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => true,
        sqlx::Error::Database(_) => sqlstate_of(err).is_some_and(|code| is_connectivity_code(&code)),
        _ => false,
    }
}

fn is_connectivity_code(code: &str) -> bool {
    code.starts_with(sqlstate::CONNECTION_EXCEPTION_CLASS) || code == sqlstate::CANNOT_CONNECT_NOW
}

/// Whether a failed `CREATE DATABASE` lost a race against an identical one.
///
/// The usual signal is `42P04`. Two sessions that pass the existence check at
/// the same time can instead collide on `pg_database`'s unique name index.
pub fn is_duplicate_database(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };
    match db_err.code().as_deref() {
        Some(sqlstate::DUPLICATE_DATABASE) => true,
        Some(sqlstate::UNIQUE_VIOLATION) => {
            db_err.constraint() == Some("pg_database_datname_index")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_unreachable_not_missing() {
        let err = TenantError::from_query("company_acme", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, TenantError::TenantUnreachable { .. }));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn io_failure_during_provisioning_is_unreachable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = TenantError::from_provisioning("company_acme", sqlx::Error::Io(io));
        assert!(matches!(err, TenantError::TenantUnreachable { .. }));
    }

    #[test]
    fn non_database_errors_are_not_duplicates() {
        assert!(!is_duplicate_database(&sqlx::Error::PoolTimedOut));
        assert!(!is_duplicate_database(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn connection_exception_class_is_connectivity() {
        assert!(is_connectivity_code("08006"));
        assert!(is_connectivity_code("57P03"));
        assert!(!is_connectivity_code("3D000"));
        assert!(!is_connectivity_code("42P04"));
    }

    #[test]
    fn rejection_hides_driver_details() {
        let (status, Json(body)) = <(StatusCode, Json<Value>)>::from(TenantError::TenantNotFound(
            "company_nevercreated".into(),
        ));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Unknown company");
        assert_eq!(body["success"], false);
    }

    #[test]
    fn forbidden_maps_to_403() {
        let err = TenantError::Forbidden("Only Superadmin can create companies".into());
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(err.public_message().contains("Superadmin"));
    }
}
