//! Identity provider for the BillBuddy backend.
//!
//! Registers and authenticates users against the shared SQLite pool and
//! issues stateless, time-limited HS256 bearer tokens. There is no
//! server-side session store: a token stays valid until its expiry, and
//! logout is a client-side concern.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::{Duration, Utc};
use cuid2::CuidConstructor;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::info;

use billbuddy_config::AuthConfig;

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing username or password")]
    MissingCredentials,
    #[error("user already exists")]
    UserExists,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("user not found")]
    UserNotFound,
    #[error("token signing failed: {0}")]
    TokenSigning(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
}

/// Claims embedded in every issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Public id of the user.
    pub sub: String,
    pub username: String,
    pub household_id: Option<String>,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

/// A registered user. The internal row id never leaves the process.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub username: String,
    pub household_id: Option<String>,
    pub role: String,
}

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let token_ttl = Duration::seconds(config.token_ttl_seconds.min(i64::MAX as u64) as i64);

        Self {
            pool,
            encoding_key,
            decoding_key,
            token_ttl,
        }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Register a new user, storing only the argon2 hash of the password.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        household_id: Option<&str>,
        role: Option<&str>,
    ) -> Result<User, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_some() {
            return Err(AuthError::UserExists);
        }

        let now = Utc::now().to_rfc3339();
        let public_id = new_public_id();
        let password_hash = hash_password(password)?;
        let role = role.unwrap_or("user");

        let result = sqlx::query(
            "INSERT INTO users (public_id, username, password_hash, household_id, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(username)
        .bind(&password_hash)
        .bind(household_id)
        .bind(role)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user = %public_id, "registered user");

        Ok(User {
            id: result.last_insert_rowid(),
            public_id,
            username: username.to_owned(),
            household_id: household_id.map(str::to_owned),
            role: role.to_owned(),
        })
    }

    /// Verify credentials and issue a bearer token. The failure is the
    /// same whether the username is unknown or the password mismatches.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let row = sqlx::query(
            "SELECT id, public_id, username, password_hash, household_id, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(AuthError::InvalidCredentials);
        };

        let stored: String = row.try_get("password_hash")?;
        let parsed_hash = PasswordHash::new(&stored).map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let user = User {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            username: row.try_get("username")?,
            household_id: row.try_get("household_id")?,
            role: row.try_get("role")?,
        };

        self.sign_token(&user)
    }

    /// Re-issue a token with identical claims and a fresh expiry. The old
    /// token is not invalidated; stateless tokens cannot be revoked.
    pub fn refresh(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.verify_token(token)?;
        self.sign_claims(claims.sub, claims.username, claims.household_id, claims.role)
    }

    /// Decode and verify a bearer token, returning its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(data.claims)
    }

    /// Fetch the current profile behind a set of claims.
    pub async fn user_profile(&self, public_id: &str) -> Result<User, AuthError> {
        let row = sqlx::query(
            "SELECT id, public_id, username, household_id, role FROM users WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(AuthError::UserNotFound);
        };

        Ok(User {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            username: row.try_get("username")?,
            household_id: row.try_get("household_id")?,
            role: row.try_get("role")?,
        })
    }

    fn sign_token(&self, user: &User) -> Result<String, AuthError> {
        self.sign_claims(
            user.public_id.clone(),
            user.username.clone(),
            user.household_id.clone(),
            user.role.clone(),
        )
    }

    fn sign_claims(
        &self,
        sub: String,
        username: String,
        household_id: Option<String>,
        role: String,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            username,
            household_id,
            role,
            iat: now.timestamp().max(0) as usize,
            exp: (now + self.token_ttl).timestamp().max(0) as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| AuthError::TokenSigning(err.to_string()))
    }
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn new_public_id() -> String {
    CUID.create_id()
}
