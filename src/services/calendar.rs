use crate::{
    db::{provision::ensure_feature_schema, Feature, TenantPool},
    error::{sqlstate, sqlstate_of, Result},
    models::calendar::{CalendarEntry, CalendarStatus, CreateEntryRequest, UpdateEntryRequest},
};

const ENTRY_SELECT: &str = "SELECT c.id, c.agenda, c.time, c.date, c.status_id, s.status_desc,
        c.client_id, cl.firstname AS name, cl.surname
    FROM calendar c
    LEFT JOIN calendar_status s ON c.status_id = s.id
    LEFT JOIN clients cl ON c.client_id = cl.id";

pub struct CalendarService;

impl CalendarService {
    pub async fn list_statuses(tenant: &TenantPool) -> Result<Vec<CalendarStatus>> {
        ensure_feature_schema(tenant, Feature::Calendar).await?;
        sqlx::query_as::<_, CalendarStatus>(
            "SELECT id, status_desc FROM calendar_status ORDER BY status_desc ASC",
        )
        .fetch_all(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))
    }

    pub async fn create_status(tenant: &TenantPool, status_desc: &str) -> Result<CalendarStatus> {
        ensure_feature_schema(tenant, Feature::Calendar).await?;
        sqlx::query_as::<_, CalendarStatus>(
            "INSERT INTO calendar_status (status_desc) VALUES ($1) RETURNING id, status_desc",
        )
        .bind(status_desc)
        .fetch_one(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))
    }

    /// Returns `false` when the status does not exist or entries still use it.
    pub async fn delete_status(tenant: &TenantPool, id: i32) -> Result<bool> {
        ensure_feature_schema(tenant, Feature::Calendar).await?;
        match sqlx::query("DELETE FROM calendar_status WHERE id = $1")
            .bind(id)
            .execute(tenant.pool())
            .await
        {
            Ok(res) => Ok(res.rows_affected() > 0),
            Err(e) if sqlstate_of(&e).as_deref() == Some(sqlstate::FOREIGN_KEY_VIOLATION) => Ok(false),
            Err(e) => Err(tenant.query_error(e)),
        }
    }

    pub async fn list_entries(tenant: &TenantPool) -> Result<Vec<CalendarEntry>> {
        ensure_feature_schema(tenant, Feature::Calendar).await?;
        sqlx::query_as::<_, CalendarEntry>(&format!("{ENTRY_SELECT} ORDER BY c.date ASC, c.time ASC"))
            .fetch_all(tenant.pool())
            .await
            .map_err(|e| tenant.query_error(e))
    }

    pub async fn create_entry(tenant: &TenantPool, req: &CreateEntryRequest) -> Result<CalendarEntry> {
        ensure_feature_schema(tenant, Feature::Calendar).await?;
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO calendar (agenda, status_id, client_id, time, date, created_at)
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING id",
        )
        .bind(&req.agenda)
        .bind(req.status_id)
        .bind(req.client_id)
        .bind(req.time.unwrap_or_default())
        .bind(req.date)
        .fetch_one(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))?;

        Self::find_entry(tenant, id)
            .await?
            .ok_or_else(|| tenant.query_error(sqlx::Error::RowNotFound))
    }

    /// Updates an entry and returns the refreshed list, or `None` if it does not exist.
    pub async fn update_entry(
        tenant: &TenantPool,
        id: i32,
        req: &UpdateEntryRequest,
    ) -> Result<Option<Vec<CalendarEntry>>> {
        ensure_feature_schema(tenant, Feature::Calendar).await?;
        let updated = sqlx::query(
            "UPDATE calendar SET agenda = $1, time = $2, status_id = $3, date = $4 WHERE id = $5",
        )
        .bind(&req.title)
        .bind(req.time)
        .bind(req.status_id)
        .bind(req.date)
        .bind(id)
        .execute(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Self::list_entries(tenant).await.map(Some)
    }

    pub async fn delete_entry(tenant: &TenantPool, id: i32) -> Result<bool> {
        ensure_feature_schema(tenant, Feature::Calendar).await?;
        let res = sqlx::query("DELETE FROM calendar WHERE id = $1")
            .bind(id)
            .execute(tenant.pool())
            .await
            .map_err(|e| tenant.query_error(e))?;
        Ok(res.rows_affected() > 0)
    }

    async fn find_entry(tenant: &TenantPool, id: i32) -> Result<Option<CalendarEntry>> {
        sqlx::query_as::<_, CalendarEntry>(&format!("{ENTRY_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(tenant.pool())
            .await
            .map_err(|e| tenant.query_error(e))
    }
}
