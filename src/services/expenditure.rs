use crate::{
    db::{provision::ensure_feature_schema, Feature, TenantPool},
    error::Result,
    models::expenditure::{CreateExpenditureRequest, Expenditure, ExpenseCategory},
};

const EXPENDITURE_COLUMNS: &str = "id, date, supplier, category_id, category_name, description,
    amount, vat_amount, payment_method, receipt_no, scan, notes, created_at";

pub struct ExpenditureService;

impl ExpenditureService {
    pub async fn list_categories(tenant: &TenantPool) -> Result<Vec<ExpenseCategory>> {
        ensure_feature_schema(tenant, Feature::Expenditure).await?;
        sqlx::query_as::<_, ExpenseCategory>(
            "SELECT id, category_name FROM expense_category ORDER BY category_name ASC",
        )
        .fetch_all(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))
    }

    /// Returns the category, creating it if the name is new.
    pub async fn ensure_category(tenant: &TenantPool, name: &str) -> Result<ExpenseCategory> {
        ensure_feature_schema(tenant, Feature::Expenditure).await?;
        sqlx::query_as::<_, ExpenseCategory>(
            "INSERT INTO expense_category (category_name) VALUES ($1)
             ON CONFLICT (category_name) DO UPDATE SET category_name = EXCLUDED.category_name
             RETURNING id, category_name",
        )
        .bind(name)
        .fetch_one(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))
    }

    pub async fn list(tenant: &TenantPool) -> Result<Vec<Expenditure>> {
        ensure_feature_schema(tenant, Feature::Expenditure).await?;
        sqlx::query_as::<_, Expenditure>(&format!(
            "SELECT {EXPENDITURE_COLUMNS} FROM expenditure ORDER BY date DESC, id DESC"
        ))
        .fetch_all(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))
    }

    /// Inserts an expense. Caller has already checked that category, description
    /// and amount are present.
    pub async fn create(
        tenant: &TenantPool,
        req: &CreateExpenditureRequest,
        category_id: i32,
        description: &str,
        amount: f64,
    ) -> Result<Expenditure> {
        ensure_feature_schema(tenant, Feature::Expenditure).await?;
        sqlx::query_as::<_, Expenditure>(&format!(
            "INSERT INTO expenditure (
                date, supplier, category_name, description, amount, payment_method,
                receipt_no, scan, notes, created_at, category_id, vat_amount
             )
             VALUES (COALESCE($1, CURRENT_DATE), $2, $3, $4, $5, $6, $7, $8, $9, NOW(), $10, $11)
             RETURNING {EXPENDITURE_COLUMNS}"
        ))
        .bind(req.date)
        .bind(&req.supplier)
        .bind(&req.category_name)
        .bind(description)
        .bind(amount)
        .bind(&req.payment_method)
        .bind(&req.receipt_no)
        .bind(&req.scan)
        .bind(&req.notes)
        .bind(category_id)
        .bind(req.vat_amount.unwrap_or(0.0))
        .fetch_one(tenant.pool())
        .await
        .map_err(|e| tenant.query_error(e))
    }
}
