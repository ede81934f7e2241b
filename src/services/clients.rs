use crate::{
    db::{provision::ensure_feature_schema, Feature, TenantPool},
    error::Result,
    models::client::{ClientSearch, ClientSummary, CreateClientRequest},
};

const SEARCH_LIMIT: i64 = 50;

pub struct ClientService;

impl ClientService {
    /// Case-insensitive substring search; blank terms match everything.
    pub async fn search(tenant: &TenantPool, search: &ClientSearch) -> Result<Vec<ClientSummary>> {
        ensure_feature_schema(tenant, Feature::Clients).await?;
        sqlx::query_as::<_, ClientSummary>(
            "SELECT id, firstname AS name, surname
             FROM clients
             WHERE ($1 = '' OR firstname ILIKE '%' || $1 || '%')
               AND ($2 = '' OR surname ILIKE '%' || $2 || '%')
             ORDER BY firstname ASC
             LIMIT $3",
        )
        .bind(search.name.trim())
        .bind(search.surname.trim())
        .bind(SEARCH_LIMIT)
        .fetch_all(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))
    }

    pub async fn create(tenant: &TenantPool, req: &CreateClientRequest) -> Result<ClientSummary> {
        ensure_feature_schema(tenant, Feature::Clients).await?;
        sqlx::query_as::<_, ClientSummary>(
            "INSERT INTO clients (firstname, surname, email, phone)
             VALUES ($1, $2, $3, $4)
             RETURNING id, firstname AS name, surname",
        )
        .bind(&req.firstname)
        .bind(&req.surname)
        .bind(&req.email)
        .bind(&req.phone)
        .fetch_one(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))
    }
}
