#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use nexsys_api::{
    config::DatabaseSettings,
    db::{self, provision, PoolRegistry},
    models::user::UserRole,
    services::directory::DirectoryService,
};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres as PostgresImage;

pub const SUPERADMIN: &str = "root";
pub const SUPERADMIN_PASSWORD: &str = "root-password";

/// Starts a disposable Postgres and returns a bootstrapped registry against it.
/// Keep the container alive for as long as the registry is used.
pub async fn setup_registry() -> (Arc<PoolRegistry>, ContainerAsync<PostgresImage>) {
    let node = PostgresImage::default()
        .start()
        .await
        .expect("Failed to start Postgres container");
    let port = node
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get host port");

    let settings = DatabaseSettings {
        host: "127.0.0.1".into(),
        port,
        user: "postgres".into(),
        password: "postgres".into(),
        system_database: "postgres".into(),
        control_database: "nexsys".into(),
        max_connections: 5,
        acquire_timeout: Duration::from_secs(10),
    };
    let registry = Arc::new(PoolRegistry::new(settings));
    db::bootstrap(&registry)
        .await
        .expect("Failed to bootstrap control database");
    (registry, node)
}

/// Registry plus one superadmin and one admin of "Acme" in the directory.
/// Acme has a directory entry but no database yet.
pub async fn setup_with_users() -> (Arc<PoolRegistry>, ContainerAsync<PostgresImage>) {
    let (registry, node) = setup_registry().await;
    for company in ["Nexsys", "Acme"] {
        provision::ensure_directory_entry(&registry, company)
            .await
            .expect("Failed to register company");
    }
    DirectoryService::insert_user(
        &registry,
        SUPERADMIN,
        SUPERADMIN_PASSWORD,
        None,
        "Nexsys",
        UserRole::SuperAdmin,
    )
    .await
    .expect("Failed to create superadmin");
    DirectoryService::insert_user(&registry, "alice", "secret", None, "Acme", UserRole::Admin)
        .await
        .expect("Failed to create admin");
    (registry, node)
}

pub async fn database_count(registry: &PoolRegistry, database: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM pg_database WHERE datname = $1")
        .bind(database)
        .fetch_one(registry.system())
        .await
        .expect("Failed to count databases")
}
