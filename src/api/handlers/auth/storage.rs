//! Database helpers for the credential store.
//!
//! The failed-attempt counter is incremented in a single atomic statement so
//! concurrent failed sign-ins for one account cannot lose updates; the lock
//! decision itself is pure and applied to the returned count.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::is_unique_violation;

const USER_COLUMNS: &str = "id, email, password_hash, avatar_url, totp_secret, \
     is_two_factor_enabled, is_locked, lock_until, login_attempts";

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created,
    Conflict,
}

/// Full credential record for one account.
#[derive(Debug)]
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) avatar_url: String,
    pub(crate) totp_secret: String,
    pub(crate) is_two_factor_enabled: bool,
    pub(crate) is_locked: bool,
    pub(crate) lock_until: Option<DateTime<Utc>>,
    pub(crate) login_attempts: i32,
}

impl UserRecord {
    /// The lock is active only while the flag is set and the expiry is in
    /// the future; the store never proactively clears it.
    pub(crate) fn lock_active(&self, now: DateTime<Utc>) -> bool {
        self.is_locked && self.lock_until.is_some_and(|until| until > now)
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        avatar_url: row.get("avatar_url"),
        totp_secret: row.get("totp_secret"),
        is_two_factor_enabled: row.get("is_two_factor_enabled"),
        is_locked: row.get("is_locked"),
        lock_until: row.get("lock_until"),
        login_attempts: row.get("login_attempts"),
    }
}

/// Create the credential store schema if it does not exist yet.
///
/// # Errors
/// Returns an error if the DDL statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    let query = r"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            avatar_url TEXT NOT NULL,
            totp_secret TEXT NOT NULL,
            is_two_factor_enabled BOOLEAN NOT NULL DEFAULT TRUE,
            is_locked BOOLEAN NOT NULL DEFAULT FALSE,
            lock_until TIMESTAMPTZ,
            login_attempts INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "CREATE TABLE",
        db.statement = query
    );
    sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to create users table")?;
    Ok(())
}

pub(super) async fn lookup_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;
    Ok(row.as_ref().map(record_from_row))
}

pub(crate) async fn lookup_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by id")?;
    Ok(row.as_ref().map(record_from_row))
}

/// Insert a new user with two-factor enabled by default.
///
/// Uniqueness is enforced by the store; a duplicate email surfaces as
/// [`SignupOutcome::Conflict`] with no mutation.
pub(super) async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    avatar_url: &str,
    totp_secret: &str,
) -> Result<SignupOutcome> {
    let query = r"
        INSERT INTO users (email, password_hash, avatar_url, totp_secret)
        VALUES ($1, $2, $3, $4)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(password_hash)
        .bind(avatar_url)
        .bind(totp_secret)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(_) => Ok(SignupOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// A failed check locks the account once the counter reaches the threshold.
pub(super) fn locks_account(attempts: i32, max_attempts: i32) -> bool {
    attempts >= max_attempts
}

/// When a lock starts, it holds for the configured window from that moment.
pub(super) fn lock_expiry(now: DateTime<Utc>, lockout_minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(lockout_minutes)
}

/// Record one failed password check; lock the account when the counter
/// reaches the threshold. The increment is a single statement so concurrent
/// failures cannot lose updates; the lock decision is [`locks_account`] over
/// the returned count.
///
/// Returns the new attempt count and whether the account is now locked.
pub(super) async fn record_failed_login(
    pool: &PgPool,
    user_id: Uuid,
    max_attempts: i32,
    lockout_minutes: i64,
) -> Result<(i32, bool)> {
    let query = r"
        UPDATE users
        SET login_attempts = login_attempts + 1,
            updated_at = now()
        WHERE id = $1
        RETURNING login_attempts
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to record failed login")?;
    let attempts: i32 = row.get("login_attempts");

    let locked = locks_account(attempts, max_attempts);
    if locked {
        let until = lock_expiry(Utc::now(), lockout_minutes);
        let query = r"
            UPDATE users
            SET is_locked = TRUE,
                lock_until = $2,
                updated_at = now()
            WHERE id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user_id)
            .bind(until)
            .execute(pool)
            .instrument(span)
            .await
            .context("failed to lock account")?;
    }

    Ok((attempts, locked))
}

/// Reset the failure counter and lock fields after a successful password
/// check, regardless of prior lock state.
pub(super) async fn clear_lockout(pool: &PgPool, user_id: Uuid) -> Result<()> {
    let query = r"
        UPDATE users
        SET login_attempts = 0,
            is_locked = FALSE,
            lock_until = NULL,
            updated_at = now()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to clear lockout state")?;
    Ok(())
}

pub(super) async fn update_password(pool: &PgPool, user_id: Uuid, password_hash: &str) -> Result<()> {
    let query = r"
        UPDATE users
        SET password_hash = $2,
            updated_at = now()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update password")?;
    Ok(())
}
