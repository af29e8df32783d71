use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use color_eyre::Result;
use ulid::Ulid;

use super::models::{AuthUser, EmailAlreadyRegistered};
use super::Db;
use crate::models::{Profile, Role};

/// Unique violations on `users.email` become [`EmailAlreadyRegistered`].
fn email_conflict(e: sqlx::Error) -> color_eyre::Report {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => EmailAlreadyRegistered.into(),
        _ => e.into(),
    }
}

impl Db {
    /// Create a verified user and its profile in one transaction.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<i32> {
        let password_hash = hash_password(password)?;
        let mut tx = self.pool.begin().await?;

        let user_id: i32 = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(email_conflict)?;

        Self::insert_profile_tx(&mut tx, user_id, full_name, role).await?;

        tx.commit().await?;

        tracing::info!("new user created: id={user_id}, email={email}, role={role}");
        Ok(user_id)
    }

    /// Create a user with email_verified = false and a verification token.
    /// Returns (user_id, token).
    pub async fn create_unverified_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<(i32, String)> {
        let password_hash = hash_password(password)?;
        let token = Ulid::new().to_string();
        let mut tx = self.pool.begin().await?;

        let user_id: i32 = sqlx::query_scalar(
            r#"INSERT INTO users (email, password_hash, email_verified, verification_token, token_expires_at)
               VALUES ($1, $2, FALSE, $3, NOW() + INTERVAL '24 hours')
               RETURNING id"#,
        )
        .bind(email)
        .bind(&password_hash)
        .bind(&token)
        .fetch_one(&mut *tx)
        .await
        .map_err(email_conflict)?;

        Self::insert_profile_tx(&mut tx, user_id, full_name, role).await?;

        tx.commit().await?;

        tracing::info!("new unverified user created: id={user_id}, email={email}, role={role}");
        Ok((user_id, token))
    }

    async fn insert_profile_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: i32,
        full_name: &str,
        role: Role,
    ) -> Result<()> {
        sqlx::query("INSERT INTO profiles (user_id, full_name, role) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(full_name)
            .bind(role.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        let user = sqlx::query_as::<_, AuthUser>("SELECT id, email FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        let stored_hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        match stored_hash {
            Some(hash) => Ok(verify_password(password, &hash)),
            None => Ok(false),
        }
    }

    pub async fn is_email_verified(&self, email: &str) -> Result<bool> {
        let verified: Option<bool> =
            sqlx::query_scalar("SELECT email_verified FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(verified.unwrap_or(false))
    }

    /// Verify a user's email using their verification token.
    /// Returns true if verification succeeded, false if token is invalid/expired.
    pub async fn verify_email_token(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE users
               SET email_verified = TRUE, verification_token = NULL, token_expires_at = NULL
               WHERE verification_token = $1 AND token_expires_at > NOW()
               AND email_verified = FALSE"#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Regenerate the verification token for an unverified user. Returns the new token.
    pub async fn regenerate_verification_token(&self, email: &str) -> Result<Option<String>> {
        let token = Ulid::new().to_string();
        let result = sqlx::query(
            r#"UPDATE users
               SET verification_token = $1, token_expires_at = NOW() + INTERVAL '24 hours'
               WHERE email = $2 AND email_verified = FALSE"#,
        )
        .bind(&token)
        .bind(email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(Some(token))
        } else {
            Ok(None)
        }
    }

    pub async fn create_user_session(&self, user_id: i32) -> Result<String> {
        let session = Ulid::new().to_string();

        sqlx::query("INSERT INTO user_sessions (id, user_id) VALUES ($1, $2)")
            .bind(&session)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("new user session created for user_id={user_id}");
        Ok(session)
    }

    pub async fn get_user_by_session(&self, session_id: &str) -> Result<Option<AuthUser>> {
        let user = sqlx::query_as::<_, AuthUser>(
            r#"
            SELECT u.id, u.email
            FROM user_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Deleting an unknown session is not an error.
    pub async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_profile(&self, user_id: i32) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT user_id, full_name, role FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// All teacher profiles in storage order.
    pub async fn list_teachers(&self) -> Result<Vec<Profile>> {
        let teachers = sqlx::query_as::<_, Profile>(
            "SELECT user_id, full_name, role FROM profiles WHERE role = $1",
        )
        .bind(Role::Teacher.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(teachers)
    }
}

/// Run argon2 hashing on a dedicated thread with a large stack to avoid
/// stack overflow in debug builds.
fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| color_eyre::eyre::eyre!("failed to hash password: {e}"))
        })?
        .join()
        .map_err(|_| color_eyre::eyre::eyre!("hash thread panicked"))?
}

fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let Ok(parsed_hash) = PasswordHash::new(&hash) else {
                return false;
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .map(|h| h.join().unwrap_or(false))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_the_original_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
