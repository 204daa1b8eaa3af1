//! Household repository: rows, the member join table, and the membership
//! lookups the authorization guard runs on every request.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::entities::household::{
    CreateHouseholdRequest, Household, HouseholdMember, UpdateHouseholdRequest,
};
use crate::error::{DatabaseError, DbResult};
use crate::new_public_id;

#[derive(Clone)]
pub struct HouseholdRepository {
    pool: SqlitePool,
}

impl HouseholdRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a household and enrol the creator as its first member.
    pub async fn create(
        &self,
        request: &CreateHouseholdRequest,
        creator_public_id: &str,
    ) -> DbResult<Household> {
        let name = request.name.as_deref().unwrap_or_default();
        let now = Utc::now().to_rfc3339();
        let public_id = new_public_id();

        let mut tx = self.pool.begin().await?;

        let creator_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE public_id = ?")
            .bind(creator_public_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(creator_id) = creator_id else {
            return Err(DatabaseError::NotFound);
        };

        let result = sqlx::query(
            "INSERT INTO households (public_id, name, household_type, role_label, total_monthly_outflow, upcoming_joint_bills, created_at, updated_at) VALUES (?, ?, ?, ?, 0, 0, ?, ?)",
        )
        .bind(&public_id)
        .bind(name)
        .bind(&request.household_type)
        .bind(&request.role_label)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let household_id = result.last_insert_rowid();

        sqlx::query(
            "INSERT INTO household_members (household_id, user_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(household_id)
        .bind(creator_id)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_by_public_id(&public_id)
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    /// Find a household by public id, members included.
    pub async fn find_by_public_id(&self, public_id: &str) -> DbResult<Option<Household>> {
        let row = sqlx::query(
            "SELECT id, public_id, name, household_type, role_label, total_monthly_outflow, upcoming_joint_bills, created_at, updated_at FROM households WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let household_id: i64 = row.get("id");
        let members = self.members_for(household_id).await?;
        Ok(Some(map_household(&row, members)))
    }

    /// List the households the given user belongs to, newest last.
    pub async fn list_for_user(
        &self,
        user_public_id: &str,
        page: i64,
        limit: i64,
    ) -> DbResult<(Vec<Household>, i64)> {
        let offset = (page.max(1) - 1) * limit;

        let rows = sqlx::query(
            r#"
            SELECT h.id, h.public_id, h.name, h.household_type, h.role_label,
                   h.total_monthly_outflow, h.upcoming_joint_bills, h.created_at, h.updated_at
            FROM households h
            JOIN household_members hm ON hm.household_id = h.id
            JOIN users u ON u.id = hm.user_id
            WHERE u.public_id = ?
            ORDER BY h.created_at ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_public_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM households h
            JOIN household_members hm ON hm.household_id = h.id
            JOIN users u ON u.id = hm.user_id
            WHERE u.public_id = ?
            "#,
        )
        .bind(user_public_id)
        .fetch_one(&self.pool)
        .await?;

        let mut households = Vec::with_capacity(rows.len());
        for row in rows {
            let household_id: i64 = row.get("id");
            let members = self.members_for(household_id).await?;
            households.push(map_household(&row, members));
        }

        Ok((households, total))
    }

    /// Membership guard: does the user currently belong to the household?
    pub async fn is_member(
        &self,
        household_public_id: &str,
        user_public_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM household_members hm
            JOIN households h ON h.id = hm.household_id
            JOIN users u ON u.id = hm.user_id
            WHERE h.public_id = ? AND u.public_id = ?
            "#,
        )
        .bind(household_public_id)
        .bind(user_public_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Apply an allow-listed patch. Fields absent from the patch keep
    /// their stored values.
    pub async fn update(
        &self,
        public_id: &str,
        patch: &UpdateHouseholdRequest,
    ) -> DbResult<Household> {
        if patch.is_empty() {
            return self
                .find_by_public_id(public_id)
                .await?
                .ok_or(DatabaseError::NotFound);
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE households SET
                name = COALESCE(?, name),
                household_type = COALESCE(?, household_type),
                role_label = COALESCE(?, role_label),
                total_monthly_outflow = COALESCE(?, total_monthly_outflow),
                upcoming_joint_bills = COALESCE(?, upcoming_joint_bills),
                updated_at = ?
            WHERE public_id = ?
            "#,
        )
        .bind(&patch.name)
        .bind(&patch.household_type)
        .bind(&patch.role_label)
        .bind(patch.total_monthly_outflow)
        .bind(patch.upcoming_joint_bills)
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

    async fn members_for(&self, household_id: i64) -> DbResult<Vec<HouseholdMember>> {
        let rows = sqlx::query(
            r#"
            SELECT u.public_id, u.username, u.role, hm.joined_at
            FROM household_members hm
            JOIN users u ON u.id = hm.user_id
            WHERE hm.household_id = ?
            ORDER BY hm.joined_at ASC
            "#,
        )
        .bind(household_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| HouseholdMember {
                public_id: row.get("public_id"),
                username: row.get("username"),
                role: row.get("role"),
                joined_at: row.get("joined_at"),
            })
            .collect())
    }
}

fn map_household(row: &sqlx::sqlite::SqliteRow, members: Vec<HouseholdMember>) -> Household {
    Household {
        id: row.get("id"),
        public_id: row.get("public_id"),
        name: row.get("name"),
        household_type: row.get("household_type"),
        role_label: row.get("role_label"),
        total_monthly_outflow: row.get("total_monthly_outflow"),
        upcoming_joint_bills: row.get("upcoming_joint_bills"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        members,
    }
}
