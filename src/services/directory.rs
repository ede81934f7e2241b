use crate::{
    db::registry::PoolRegistry,
    error::{Result, TenantError},
    models::{
        company::Company,
        user::{CreateUserRequest, User, UserRole},
    },
};

/// Result of a user-creation request made on behalf of another user.
#[derive(Debug, PartialEq, Eq)]
pub enum CreateUserOutcome {
    Created,
    CreatorNotFound,
    /// Creator lacks the rights; carries the reason shown to the caller.
    NotAllowed(&'static str),
    UnknownCompany,
    AlreadyExists,
}

/// Reads and writes the control-plane directory (`companies`, `users`).
pub struct DirectoryService;

impl DirectoryService {
    /// Role of the first user registered under `username`, if any.
    pub async fn user_role(registry: &PoolRegistry, username: &str) -> Result<Option<UserRole>> {
        let user = Self::find_user(registry, username).await?;
        Ok(user.map(|u| u.role()))
    }

    pub async fn find_user(registry: &PoolRegistry, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password, email, company_name, role, created_at
             FROM users WHERE username = $1 ORDER BY id LIMIT 1",
        )
        .bind(username)
        .fetch_optional(registry.control())
        .await
        .map_err(|e| control_error(registry, e))
    }

    /// Checks credentials for `username` within `company`.
    pub async fn authenticate(
        registry: &PoolRegistry,
        username: &str,
        company: &str,
        password: &str,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, email, company_name, role, created_at
             FROM users WHERE username = $1 AND company_name = $2",
        )
        .bind(username)
        .bind(company)
        .fetch_optional(registry.control())
        .await
        .map_err(|e| control_error(registry, e))?;

        let Some(user) = user else {
            return Ok(None);
        };
        let valid = match user.password.as_deref() {
            Some(hash) => bcrypt::verify(password, hash).unwrap_or(false),
            None => false,
        };
        Ok(valid.then_some(user))
    }

    /// Creates a plain `user`. Admins may only add users to their own company;
    /// superadmins to any.
    pub async fn create_user(
        registry: &PoolRegistry,
        req: &CreateUserRequest,
    ) -> Result<CreateUserOutcome> {
        let Some(creator) = Self::find_user(registry, &req.creator_username).await? else {
            return Ok(CreateUserOutcome::CreatorNotFound);
        };

        match creator.role() {
            UserRole::SuperAdmin => {}
            UserRole::Admin if creator.company_name.as_deref() == Some(req.company.as_str()) => {}
            UserRole::Admin => {
                return Ok(CreateUserOutcome::NotAllowed(
                    "Cannot create users outside your company",
                ))
            }
            UserRole::User => {
                return Ok(CreateUserOutcome::NotAllowed("Only admins can create users"))
            }
        }

        if !Self::company_exists(registry, &req.company).await? {
            return Ok(CreateUserOutcome::UnknownCompany);
        }

        let inserted = Self::insert_user(
            registry,
            &req.username,
            &req.password,
            req.email.as_deref(),
            &req.company,
            UserRole::User,
        )
        .await?;

        Ok(if inserted {
            tracing::info!(
                "User {} created in {:?} by {}",
                req.username,
                req.company,
                req.creator_username
            );
            CreateUserOutcome::Created
        } else {
            CreateUserOutcome::AlreadyExists
        })
    }

    /// Inserts a user with a bcrypt-hashed password. Returns `false` when the
    /// username already exists in that company.
    pub async fn insert_user(
        registry: &PoolRegistry,
        username: &str,
        password: &str,
        email: Option<&str>,
        company: &str,
        role: UserRole,
    ) -> Result<bool> {
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        let result = sqlx::query(
            "INSERT INTO users (username, password, email, company_name, role)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (username, company_name) DO NOTHING",
        )
        .bind(username)
        .bind(&hash)
        .bind(email)
        .bind(company)
        .bind(role.to_string())
        .execute(registry.control())
        .await
        .map_err(|e| control_error(registry, e))?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn company_exists(registry: &PoolRegistry, company: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM companies WHERE company_name = $1)")
            .bind(company)
            .fetch_one(registry.control())
            .await
            .map_err(|e| control_error(registry, e))
    }

    pub async fn list_companies(registry: &PoolRegistry) -> Result<Vec<Company>> {
        sqlx::query_as::<_, Company>(
            "SELECT id, company_name, created_at FROM companies ORDER BY company_name",
        )
        .fetch_all(registry.control())
        .await
        .map_err(|e| control_error(registry, e))
    }

    pub async fn list_users(registry: &PoolRegistry) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password, email, company_name, role, created_at
             FROM users ORDER BY company_name, username",
        )
        .fetch_all(registry.control())
        .await
        .map_err(|e| control_error(registry, e))
    }
}

fn control_error(registry: &PoolRegistry, err: sqlx::Error) -> TenantError {
    TenantError::from_query(&registry.settings().control_database, err)
}
