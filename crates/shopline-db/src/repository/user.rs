//! # User Repository
//!
//! Customer directory: accounts, roles, loyalty tiers and password hashes.
//!
//! ## Password Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register(password)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Argon2id + random salt ──► "$argon2id$v=19$m=19456,t=2,p=1$..."       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  users.password_hash (plaintext never stored, never logged)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use shopline_core::validation::{
    validate_email, validate_password, validate_person_name, validate_phone,
};
use shopline_core::{Role, Tier, User, ValidationError};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = "user_id, first_name, last_name, email, phone_number, role, tier, \
     password_hash, created_date";

/// Fields of a new account. `password` is hashed before it reaches SQL.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub role: Role,
    pub tier: Tier,
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Checks a password against a stored PHC hash string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Executor-generic queries (shared with workflows)
// =============================================================================

pub(crate) async fn fetch_user<'e, E: SqliteExecutor<'e>>(
    exec: E,
    user_id: i64,
) -> DbResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE user_id = ?", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(exec)
        .await?;
    Ok(user)
}

pub(crate) async fn fetch_by_phone<'e, E: SqliteExecutor<'e>>(
    exec: E,
    phone: &str,
) -> DbResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE phone_number = ?", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(phone)
        .fetch_optional(exec)
        .await?;
    Ok(user)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers an account.
    ///
    /// ## Rules
    /// - Names 1-50 characters, email well-formed and unique
    /// - Phone optional, unique when present
    /// - Only customers may carry a tier other than `None`
    pub async fn register(&self, new: NewUser) -> DbResult<User> {
        let (first_name, last_name) = validate_person_name(&new.first_name, &new.last_name)?;
        let email = validate_email(&new.email)?;
        let phone = match new.phone_number.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(p) => Some(validate_phone(p)?),
        };
        validate_password(&new.password)?;
        if new.tier != Tier::None && new.role != Role::Customer {
            return Err(ValidationError::TierRequiresCustomer.into());
        }

        let password_hash = hash_password(&new.password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, email, phone_number, role, tier,
                               password_hash, created_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&first_name)
        .bind(&last_name)
        .bind(&email)
        .bind(&phone)
        .bind(new.role)
        .bind(new.tier)
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.ends_with("email") => {
                DbError::duplicate("email", email.clone())
            }
            DbError::UniqueViolation { field, .. } if field.ends_with("phone_number") => {
                DbError::duplicate("phoneNumber", phone.clone().unwrap_or_default())
            }
            other => other,
        })?;

        let user_id = result.last_insert_rowid();
        info!(user_id, role = %new.role, "User registered");
        self.get_by_id(user_id).await
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, user_id: i64) -> DbResult<User> {
        fetch_user(&self.pool, user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", user_id))
    }

    /// Finds the account registered with a phone number.
    pub async fn find_by_phone(&self, phone: &str) -> DbResult<Option<User>> {
        debug!("Looking up user by phone");
        fetch_by_phone(&self.pool, phone.trim()).await
    }

    /// Finds the account registered with an email address.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Lists accounts, optionally only those with one role.
    pub async fn list(&self, role: Option<Role>) -> DbResult<Vec<User>> {
        let users = match role {
            Some(role) => {
                let sql = format!(
                    "SELECT {} FROM users WHERE role = ? ORDER BY last_name, first_name, user_id",
                    USER_COLUMNS
                );
                sqlx::query_as::<_, User>(&sql)
                    .bind(role)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM users ORDER BY last_name, first_name, user_id",
                    USER_COLUMNS
                );
                sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?
            }
        };
        Ok(users)
    }

    /// Checks credentials. Returns the user only when the password matches.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> DbResult<Option<User>> {
        let user = match self.find_by_email(email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            warn!(user_id = user.user_id, "Password verification failed");
            Ok(None)
        }
    }

    /// Sets the loyalty tier of a customer.
    pub async fn set_tier(&self, user_id: i64, tier: Tier) -> DbResult<User> {
        let user = self.get_by_id(user_id).await?;
        if user.role != Role::Customer && tier != Tier::None {
            return Err(ValidationError::TierRequiresCustomer.into());
        }

        sqlx::query("UPDATE users SET tier = ? WHERE user_id = ?")
            .bind(tier)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        info!(user_id, tier = %tier, "Customer tier changed");
        self.get_by_id(user_id).await
    }

    /// Deletes an account.
    ///
    /// Refused while the user still owns shops. Cart entries go with the
    /// account; past sales keep their phone and lose the user reference.
    pub async fn delete(&self, user_id: i64) -> DbResult<()> {
        let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shops WHERE proprietor_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        if owned > 0 {
            return Err(DbError::ForeignKeyViolation {
                message: format!("user {} still owns {} shop(s)", user_id, owned),
            });
        }

        let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        info!(user_id, "User deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::{Database, DbConfig};
    use shopline_core::CoreError;

    fn new_user(email: &str, phone: Option<&str>, role: Role, tier: Tier) -> NewUser {
        NewUser {
            first_name: "Robin".to_string(),
            last_name: "Hale".to_string(),
            email: email.to_string(),
            phone_number: phone.map(str::to_string),
            password: "open sesame".to_string(),
            role,
            tier,
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = db
            .users()
            .register(new_user("Robin@Example.com", Some("5550100"), Role::Customer, Tier::Gold))
            .await
            .unwrap();

        assert_eq!(user.email, "robin@example.com");
        assert_ne!(user.password_hash, "open sesame");
        assert!(user.password_hash.starts_with("$argon2"));

        let ok = db
            .users()
            .verify_credentials("robin@example.com", "open sesame")
            .await
            .unwrap();
        assert_eq!(ok.map(|u| u.user_id), Some(user.user_id));
        let bad = db
            .users()
            .verify_credentials("robin@example.com", "wrong password")
            .await
            .unwrap();
        assert!(bad.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_and_phone_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users()
            .register(new_user("a@example.com", Some("5550100"), Role::Customer, Tier::None))
            .await
            .unwrap();

        let err = db
            .users()
            .register(new_user("a@example.com", None, Role::Customer, Tier::None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));

        let err = db
            .users()
            .register(new_user("b@example.com", Some("5550100"), Role::Customer, Tier::None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "phoneNumber"));
    }

    #[tokio::test]
    async fn test_tier_requires_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .users()
            .register(new_user("p@example.com", None, Role::Proprietor, Tier::Silver))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::TierRequiresCustomer))
        ));

        let customer = db
            .users()
            .register(new_user("c@example.com", None, Role::Customer, Tier::None))
            .await
            .unwrap();
        let upgraded = db.users().set_tier(customer.user_id, Tier::Platinum).await.unwrap();
        assert_eq!(upgraded.tier, Tier::Platinum);
    }

    #[tokio::test]
    async fn test_delete_refused_while_owning_shops() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = testing::proprietor(&db, "owner@example.com").await;
        testing::shop(&db, owner.user_id).await;

        let err = db.users().delete(owner.user_id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(db.users().get_by_id(owner.user_id).await.is_ok());
    }
}
