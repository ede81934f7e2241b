/// Operator tasks against the control plane.
///
/// Usage:
///   nexsys-admin bootstrap --username NAME --password PASS [--email EMAIL]
///   nexsys-admin provision --company NAME
///   nexsys-admin list
use std::sync::Arc;

use clap::{Parser, Subcommand};

use nexsys_api::{
    config::DatabaseSettings,
    db::{self, normalize, provision, PoolRegistry},
    models::user::UserRole,
    services::{directory::DirectoryService, tenancy::TenantRouter},
};

/// Company the first superadmin is recorded under.
const SYSTEM_COMPANY: &str = "Nexsys";

#[derive(Parser)]
#[command(name = "nexsys-admin", about = "Manage nexsys companies and their databases")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the control database and its tables, then the first superadmin.
    Bootstrap {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Create a company's database and directory entry.
    Provision {
        #[arg(long)]
        company: String,
    },
    /// List companies with the database each one routes to.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let registry = Arc::new(PoolRegistry::new(DatabaseSettings::from_env()?));

    match args.command {
        Command::Bootstrap { username, password, email } => {
            db::bootstrap(&registry).await?;
            provision::ensure_directory_entry(&registry, SYSTEM_COMPANY).await?;
            let created = DirectoryService::insert_user(
                &registry,
                &username,
                &password,
                email.as_deref(),
                SYSTEM_COMPANY,
                UserRole::SuperAdmin,
            )
            .await?;
            if created {
                tracing::info!("Superadmin {username} created");
            } else {
                tracing::info!("Superadmin {username} already exists");
            }
        }
        Command::Provision { company } => {
            db::bootstrap(&registry).await?;
            let router = TenantRouter::new(registry.clone());
            let outcome = router
                .provision_new_tenant(&company, &UserRole::SuperAdmin)
                .await?;
            println!(
                "{company}\t{}\tdatabase {}\tdirectory {}",
                outcome.database,
                if outcome.database_created { "created" } else { "existing" },
                if outcome.directory_created { "created" } else { "existing" },
            );
        }
        Command::List => {
            let companies = DirectoryService::list_companies(&registry).await?;
            for company in companies {
                let Some(name) = company.company_name else {
                    continue;
                };
                match normalize(&name) {
                    Ok(database) => println!("{name}\t{database}"),
                    Err(e) => println!("{name}\t<{e}>"),
                }
            }
        }
    }

    Ok(())
}
