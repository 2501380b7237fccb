//! # User Repository
//!
//! Database operations for users and their permission grants.
//!
//! ## Roles vs Permissions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  role (users.role)            permission (user_permissions)             │
//! │  ──────────────────           ──────────────────────────────            │
//! │  admin / user / investor      contact_read_all, contact_update_all      │
//! │  coarse, exactly one          fine-grained, zero or more per user       │
//! │  admins bypass grants         widens ownership-scoped access            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit;
use crate::error::{DbError, DbResult};
use crate::row::map_user;
use zargar_core::principal::validate_permission_name;
use zargar_core::{InvestorStatus, Principal, Role, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a new user. Admin-only at the engine/API boundary.
    ///
    /// `password_hash` must already be an Argon2 hash; this layer never
    /// sees plaintext passwords.
    pub async fn create(
        &self,
        actor_id: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> DbResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %user.id, username = %user.username, "Creating user");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_create(&mut tx, actor_id, "users", &user).await?;
        tx.commit().await?;

        Ok(user)
    }

    /// Creates the first admin account when the users table is empty.
    ///
    /// There is no pre-existing actor to attribute the audit row to, so
    /// the new admin signs its own creation. Fails once any user exists.
    pub async fn bootstrap_admin(&self, username: &str, password_hash: &str) -> DbResult<User> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Err(DbError::invalid_state(
                "bootstrap is only allowed on an empty user table",
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role: Role::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_create(&mut tx, &user.id, "users", &user).await?;
        tx.commit().await?;

        info!(username = %user.username, "Bootstrapped initial admin account");
        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_user).transpose()
    }

    /// Existence-checked variant used before recording foreign keys.
    pub async fn get_or_404(&self, id: &str) -> DbResult<User> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_user).transpose()
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_user).collect()
    }

    /// Activates or deactivates a user. Inactive users cannot log in.
    pub async fn set_active(&self, actor_id: &str, id: &str, is_active: bool) -> DbResult<User> {
        let before = self.get_or_404(id).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let mut after = before.clone();
        after.is_active = is_active;
        after.updated_at = now;

        audit::record_update(&mut tx, actor_id, "users", &before, &after).await?;
        tx.commit().await?;

        Ok(after)
    }

    /// Replaces a user's password hash.
    pub async fn update_password(&self, actor_id: &str, id: &str, password_hash: &str) -> DbResult<()> {
        let before = self.get_or_404(id).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(password_hash)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let mut after = before.clone();
        after.password_hash = password_hash.to_string();
        after.updated_at = now;

        // The hash itself is serialized into the audit states; acceptable
        // because audit_logs is an admin-only surface and hashes are not
        // reversible.
        audit::record_update(&mut tx, actor_id, "users", &before, &after).await?;
        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    // Permission Grants
    // =========================================================================

    /// Grants a named permission to a user. Idempotent.
    pub async fn grant_permission(&self, actor_id: &str, user_id: &str, permission: &str) -> DbResult<()> {
        validate_permission_name(permission).map_err(DbError::Domain)?;
        self.get_or_404(user_id).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_permissions (id, user_id, permission, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(permission)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            audit::record_create(
                &mut tx,
                actor_id,
                "user_permissions",
                &serde_json::json!({ "user_id": user_id, "permission": permission }),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Revokes a named permission from a user.
    pub async fn revoke_permission(&self, actor_id: &str, user_id: &str, permission: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM user_permissions WHERE user_id = ?1 AND permission = ?2")
            .bind(user_id)
            .bind(permission)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Permission grant",
                format!("{user_id}/{permission}"),
            ));
        }

        audit::record_delete(
            &mut tx,
            actor_id,
            "user_permissions",
            &serde_json::json!({ "user_id": user_id, "permission": permission }),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Lists the permission names granted to a user.
    pub async fn permissions(&self, user_id: &str) -> DbResult<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT permission FROM user_permissions WHERE user_id = ?1 ORDER BY permission",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Builds the Principal the engines take on every call.
    ///
    /// Fails for unknown or deactivated users so a stale token cannot
    /// act after an account is disabled. Investor accounts are further
    /// gated by their business status: a suspended or closed investor
    /// profile refuses the whole account, not just investor surfaces.
    pub async fn load_principal(&self, user_id: &str) -> DbResult<Principal> {
        let user = self.get_or_404(user_id).await?;
        if !user.is_active {
            return Err(DbError::Domain(zargar_core::CoreError::permission_denied(
                "account is deactivated",
            )));
        }

        if user.role == Role::Investor {
            let status: Option<String> =
                sqlx::query_scalar("SELECT status FROM investors WHERE user_id = ?1")
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if let Some(status) = status {
                let status: InvestorStatus = status.parse().map_err(DbError::Decode)?;
                if status != InvestorStatus::Active {
                    return Err(DbError::Domain(zargar_core::CoreError::permission_denied(
                        "investor account is suspended or closed",
                    )));
                }
            }
        }

        let permissions = self.permissions(user_id).await?;
        Ok(Principal::new(user.id, user.role, permissions))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> (Database, Principal) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin_user = db
            .users()
            .bootstrap_admin("admin", "argon2-hash")
            .await
            .unwrap();
        let admin = db.users().load_principal(&admin_user.id).await.unwrap();
        (db, admin)
    }

    #[tokio::test]
    async fn test_investor_status_gates_principal() {
        let (db, admin) = setup().await;

        let account = db
            .users()
            .create(&admin.user_id, "parvin", "argon2-hash", Role::Investor)
            .await
            .unwrap();
        let contact = db
            .contacts()
            .create(&admin, "Parvin Ahmadi", "investor", None, None)
            .await
            .unwrap();
        let investor = db
            .investors()
            .create(&admin, &account.id, &contact.id)
            .await
            .unwrap();

        // Active profiles authenticate normally.
        assert!(db.users().load_principal(&account.id).await.is_ok());

        db.investors()
            .set_status(&admin, &investor.id, InvestorStatus::Suspended)
            .await
            .unwrap();
        assert!(matches!(
            db.users().load_principal(&account.id).await,
            Err(DbError::Domain(
                zargar_core::CoreError::PermissionDenied(_)
            ))
        ));

        db.investors()
            .set_status(&admin, &investor.id, InvestorStatus::Closed)
            .await
            .unwrap();
        assert!(db.users().load_principal(&account.id).await.is_err());

        // Reinstating the profile restores access.
        db.investors()
            .set_status(&admin, &investor.id, InvestorStatus::Active)
            .await
            .unwrap();
        assert!(db.users().load_principal(&account.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_investor_role_without_profile_still_authenticates() {
        let (db, admin) = setup().await;

        // An investor-role account whose profile has not been registered
        // yet has nothing to gate on.
        let account = db
            .users()
            .create(&admin.user_id, "pending", "argon2-hash", Role::Investor)
            .await
            .unwrap();
        assert!(db.users().load_principal(&account.id).await.is_ok());
    }
}
