use crate::{
    db::{provision::ensure_feature_schema, Feature, TenantPool},
    error::TenantError,
    models::email::{EmailSettings, EmailSettingsRow, SaveEmailSettingsRequest},
    services::encryption::{decrypt_secret, derive_tenant_key, encrypt_secret},
};

/// Per-tenant SMTP/IMAP account settings. The mailbox password is stored
/// encrypted under a key derived for that tenant's database.
pub struct EmailSettingsService;

impl EmailSettingsService {
    /// Upserts the settings for `req.email`.
    pub async fn save(
        tenant: &TenantPool,
        master_key: &[u8; 32],
        req: &SaveEmailSettingsRequest,
    ) -> anyhow::Result<EmailSettings> {
        ensure_feature_schema(tenant, Feature::Email).await?;
        let key = derive_tenant_key(master_key, tenant.name().as_str())?;
        let encrypted = encrypt_secret(&req.password, &key)?;

        let row = sqlx::query_as::<_, EmailSettingsRow>(
            "INSERT INTO email_settings (smtp_host, smtp_port, imap_host, imap_port, email, password)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (email) DO UPDATE
             SET smtp_host = EXCLUDED.smtp_host,
                 smtp_port = EXCLUDED.smtp_port,
                 imap_host = EXCLUDED.imap_host,
                 imap_port = EXCLUDED.imap_port,
                 password  = EXCLUDED.password
             RETURNING id, smtp_host, smtp_port, imap_host, imap_port, email, password",
        )
        .bind(&req.smtp_host)
        .bind(req.smtp_port)
        .bind(&req.imap_host)
        .bind(req.imap_port)
        .bind(&req.email)
        .bind(&encrypted)
        .fetch_one(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))?;

        tracing::info!("Saved email settings for {} on {}", row.email, tenant.name());
        Ok(Self::to_settings(row, &req.password))
    }

    /// The tenant's configured account, password decrypted.
    pub async fn load(tenant: &TenantPool, master_key: &[u8; 32]) -> anyhow::Result<Option<EmailSettings>> {
        ensure_feature_schema(tenant, Feature::Email).await?;
        let row = sqlx::query_as::<_, EmailSettingsRow>(
            "SELECT id, smtp_host, smtp_port, imap_host, imap_port, email, password
             FROM email_settings ORDER BY id LIMIT 1",
        )
        .fetch_optional(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let key = derive_tenant_key(master_key, tenant.name().as_str())?;
        let password = decrypt_secret(&row.password, &key)?;
        Ok(Some(Self::to_settings(row, &password)))
    }

    fn to_settings(row: EmailSettingsRow, password: &str) -> EmailSettings {
        EmailSettings {
            id: row.id,
            smtp_host: row.smtp_host,
            smtp_port: row.smtp_port,
            imap_host: row.imap_host,
            imap_port: row.imap_port,
            email: row.email,
            password: password.to_string(),
        }
    }
}

/// Pulls a routing error back out of an `anyhow` chain so handlers can still
/// answer 404/503 instead of a generic 500.
pub fn tenant_error(err: &anyhow::Error) -> Option<&TenantError> {
    err.chain().find_map(|e| e.downcast_ref::<TenantError>())
}
