//! Repositories for the admin panel records. These rows have no
//! relations; every operation is a single statement.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::entities::admin::{
    ComplianceStatus, CreateRiskFlagRequest, RiskFlag, RiskFlagFilter, UpdateRiskFlagRequest,
    WebhookStatus,
};
use crate::error::{DatabaseError, DbResult};
use crate::new_public_id;

#[derive(Clone)]
pub struct ComplianceRepository {
    pool: SqlitePool,
}

impl ComplianceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, status: &str) -> DbResult<ComplianceStatus> {
        let now = Utc::now().to_rfc3339();
        let public_id = new_public_id();

        sqlx::query(
            "INSERT INTO compliance_statuses (public_id, status, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(status)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_public_id(&public_id)
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DbResult<Option<ComplianceStatus>> {
        let row = sqlx::query(
            "SELECT id, public_id, status, created_at, updated_at FROM compliance_statuses WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ComplianceStatus {
            id: row.get("id"),
            public_id: row.get("public_id"),
            status: row.get("status"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    pub async fn update(&self, public_id: &str, status: Option<&str>) -> DbResult<ComplianceStatus> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE compliance_statuses SET status = COALESCE(?, status), updated_at = ? WHERE public_id = ?",
        )
        .bind(status)
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
        let result = sqlx::query("DELETE FROM compliance_statuses WHERE public_id = ?")
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        Ok(())
    }

    pub async fn list(&self) -> DbResult<Vec<ComplianceStatus>> {
        let rows = sqlx::query(
            "SELECT id, public_id, status, created_at, updated_at FROM compliance_statuses ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ComplianceStatus {
                id: row.get("id"),
                public_id: row.get("public_id"),
                status: row.get("status"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    pub async fn count_by_status(&self, status: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM compliance_statuses WHERE status = ?")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct WebhookRepository {
    pool: SqlitePool,
}

impl WebhookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, status: &str) -> DbResult<WebhookStatus> {
        let now = Utc::now().to_rfc3339();
        let public_id = new_public_id();

        sqlx::query(
            "INSERT INTO webhook_statuses (public_id, status, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(status)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_public_id(&public_id)
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DbResult<Option<WebhookStatus>> {
        let row = sqlx::query(
            "SELECT id, public_id, status, created_at, updated_at FROM webhook_statuses WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| WebhookStatus {
            id: row.get("id"),
            public_id: row.get("public_id"),
            status: row.get("status"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    pub async fn update(&self, public_id: &str, status: Option<&str>) -> DbResult<WebhookStatus> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE webhook_statuses SET status = COALESCE(?, status), updated_at = ? WHERE public_id = ?",
        )
        .bind(status)
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
        let result = sqlx::query("DELETE FROM webhook_statuses WHERE public_id = ?")
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        Ok(())
    }

    pub async fn list(&self) -> DbResult<Vec<WebhookStatus>> {
        let rows = sqlx::query(
            "SELECT id, public_id, status, created_at, updated_at FROM webhook_statuses ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| WebhookStatus {
                id: row.get("id"),
                public_id: row.get("public_id"),
                status: row.get("status"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct RiskFlagRepository {
    pool: SqlitePool,
}

impl RiskFlagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a flag; the caller has already validated required fields.
    pub async fn create(&self, request: &CreateRiskFlagRequest) -> DbResult<RiskFlag> {
        let now = Utc::now().to_rfc3339();
        let public_id = new_public_id();

        sqlx::query(
            "INSERT INTO risk_flags (public_id, user_id, user_name, flag_type, category, title, description, severity, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(&request.user_id)
        .bind(&request.user_name)
        .bind(&request.flag_type)
        .bind(&request.category)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.severity)
        .bind(&request.status)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_public_id(&public_id)
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DbResult<Option<RiskFlag>> {
        let row = sqlx::query(
            "SELECT id, public_id, user_id, user_name, flag_type, category, title, description, severity, status, created_at, updated_at FROM risk_flags WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| map_risk_flag(&row)))
    }

    pub async fn update(
        &self,
        public_id: &str,
        patch: &UpdateRiskFlagRequest,
    ) -> DbResult<RiskFlag> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE risk_flags SET
                user_name = COALESCE(?, user_name),
                flag_type = COALESCE(?, flag_type),
                category = COALESCE(?, category),
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                severity = COALESCE(?, severity),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE public_id = ?
            "#,
        )
        .bind(&patch.user_name)
        .bind(&patch.flag_type)
        .bind(&patch.category)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.severity)
        .bind(&patch.status)
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
        let result = sqlx::query("DELETE FROM risk_flags WHERE public_id = ?")
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        Ok(())
    }

    pub async fn list(&self, filter: &RiskFlagFilter) -> DbResult<Vec<RiskFlag>> {
        let mut conditions = String::new();
        if filter.status.is_some() {
            conditions.push_str(" AND status = ?");
        }
        if filter.flag_type.is_some() {
            conditions.push_str(" AND flag_type = ?");
        }
        if filter.category.is_some() {
            conditions.push_str(" AND category = ?");
        }

        let sql = format!(
            "SELECT id, public_id, user_id, user_name, flag_type, category, title, description, severity, status, created_at, updated_at FROM risk_flags WHERE 1 = 1{conditions} ORDER BY created_at ASC"
        );

        let mut query = sqlx::query(&sql);
        if let Some(status) = &filter.status {
            query = query.bind(status);
        }
        if let Some(flag_type) = &filter.flag_type {
            query = query.bind(flag_type);
        }
        if let Some(category) = &filter.category {
            query = query.bind(category);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(map_risk_flag).collect())
    }
}

fn map_risk_flag(row: &sqlx::sqlite::SqliteRow) -> RiskFlag {
    RiskFlag {
        id: row.get("id"),
        public_id: row.get("public_id"),
        user_id: row.get("user_id"),
        user_name: row.get("user_name"),
        flag_type: row.get("flag_type"),
        category: row.get("category"),
        title: row.get("title"),
        description: row.get("description"),
        severity: row.get("severity"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
