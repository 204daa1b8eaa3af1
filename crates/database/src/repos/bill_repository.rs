//! Bill repository: membership-scoped listings plus single-row CRUD.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::entities::bill::{Bill, BillSort, UpdateBillRequest};
use crate::error::{DatabaseError, DbResult};
use crate::new_public_id;

/// Listing options for [`BillRepository::list_for_user`].
#[derive(Debug, Clone, Default)]
pub struct BillListFilter {
    /// Restrict to one household (public id).
    pub household_id: Option<String>,
    /// Equality filter on the bill status.
    pub status: Option<String>,
    pub sort: BillSort,
    pub page: i64,
    pub limit: i64,
}

/// Validated input for creating a bill; assembled by the service layer
/// after required-field checks.
#[derive(Debug, Clone)]
pub struct NewBill {
    pub household_public_id: String,
    pub amount: f64,
    pub due_date: String,
    pub status: String,
    pub biller_name: String,
    pub category: Option<String>,
    pub is_recurring: Option<bool>,
    pub predicted_amount: Option<f64>,
}

#[derive(Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

const BILL_COLUMNS: &str = "b.id, b.public_id, h.public_id AS household_public_id, b.amount, b.due_date, b.status, b.biller_name, b.category, b.is_recurring, b.predicted_amount, b.created_at, b.updated_at";

impl BillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a bill under the given household. Fails with `NotFound`
    /// when the household does not exist; no membership check happens
    /// here.
    pub async fn create(&self, new_bill: &NewBill) -> DbResult<Bill> {
        let household_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM households WHERE public_id = ?")
                .bind(&new_bill.household_public_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(household_id) = household_id else {
            return Err(DatabaseError::NotFound);
        };

        let now = Utc::now().to_rfc3339();
        let public_id = new_public_id();

        sqlx::query(
            "INSERT INTO bills (public_id, household_id, amount, due_date, status, biller_name, category, is_recurring, predicted_amount, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(household_id)
        .bind(new_bill.amount)
        .bind(&new_bill.due_date)
        .bind(&new_bill.status)
        .bind(&new_bill.biller_name)
        .bind(&new_bill.category)
        .bind(new_bill.is_recurring)
        .bind(new_bill.predicted_amount)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_public_id(&public_id)
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DbResult<Option<Bill>> {
        let row = sqlx::query(&format!(
            "SELECT {BILL_COLUMNS} FROM bills b JOIN households h ON h.id = b.household_id WHERE b.public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| map_bill(&row)))
    }

    /// List the bills visible to a user: only bills whose household the
    /// user belongs to, optionally narrowed to one household or status.
    pub async fn list_for_user(
        &self,
        user_public_id: &str,
        filter: &BillListFilter,
    ) -> DbResult<(Vec<Bill>, i64)> {
        let mut conditions = String::new();
        if filter.household_id.is_some() {
            conditions.push_str(" AND h.public_id = ?");
        }
        if filter.status.is_some() {
            conditions.push_str(" AND b.status = ?");
        }

        let base = format!(
            r#"
            FROM bills b
            JOIN households h ON h.id = b.household_id
            JOIN household_members hm ON hm.household_id = h.id
            JOIN users u ON u.id = hm.user_id
            WHERE u.public_id = ?{conditions}
            "#
        );

        let limit = filter.limit.max(0);
        let offset = (filter.page.max(1) - 1) * limit;
        let list_sql = format!(
            "SELECT {BILL_COLUMNS} {base} ORDER BY b.{} ASC LIMIT ? OFFSET ?",
            filter.sort.column()
        );

        let mut list_query = sqlx::query(&list_sql).bind(user_public_id);
        if let Some(household_id) = &filter.household_id {
            list_query = list_query.bind(household_id);
        }
        if let Some(status) = &filter.status {
            list_query = list_query.bind(status);
        }
        let rows = list_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) {base}");
        let mut count_query = sqlx::query_scalar(&count_sql).bind(user_public_id);
        if let Some(household_id) = &filter.household_id {
            count_query = count_query.bind(household_id);
        }
        if let Some(status) = &filter.status {
            count_query = count_query.bind(status);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?;

        Ok((rows.iter().map(map_bill).collect(), total))
    }

    /// Apply an allow-listed patch; the owning household never changes.
    pub async fn update(&self, public_id: &str, patch: &UpdateBillRequest) -> DbResult<Bill> {
        if patch.is_empty() {
            return self
                .find_by_public_id(public_id)
                .await?
                .ok_or(DatabaseError::NotFound);
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE bills SET
                amount = COALESCE(?, amount),
                due_date = COALESCE(?, due_date),
                status = COALESCE(?, status),
                biller_name = COALESCE(?, biller_name),
                category = COALESCE(?, category),
                is_recurring = COALESCE(?, is_recurring),
                predicted_amount = COALESCE(?, predicted_amount),
                updated_at = ?
            WHERE public_id = ?
            "#,
        )
        .bind(patch.amount)
        .bind(&patch.due_date)
        .bind(&patch.status)
        .bind(&patch.biller_name)
        .bind(&patch.category)
        .bind(patch.is_recurring)
        .bind(patch.predicted_amount)
        .bind(&now)
        .bind(public_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        self.find_by_public_id(public_id)
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    pub async fn delete(&self, public_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM bills WHERE public_id = ?")
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        Ok(())
    }
}

fn map_bill(row: &sqlx::sqlite::SqliteRow) -> Bill {
    Bill {
        id: row.get("id"),
        public_id: row.get("public_id"),
        household_id: row.get("household_public_id"),
        amount: row.get("amount"),
        due_date: row.get("due_date"),
        status: row.get("status"),
        biller_name: row.get("biller_name"),
        category: row.get("category"),
        is_recurring: row.get("is_recurring"),
        predicted_amount: row.get("predicted_amount"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
