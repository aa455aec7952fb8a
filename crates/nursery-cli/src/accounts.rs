//! Account maintenance: bootstrapping the first super admin and purging
//! parent sign-ups that never verified their email.

use nursery_core::validation::validate_strong_password;
use nursery_core::{hash_password, permissions};
use sqlx::PgPool;
use uuid::Uuid;

pub const DEFAULT_UNVERIFIED_DAYS: i32 = 7;

#[derive(Debug)]
pub struct SuperuserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl SuperuserInput {
    /// Trims names, lowercases the email and checks password strength.
    pub fn normalized(self) -> Result<Self, Box<dyn std::error::Error>> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let email = self.email.trim().to_lowercase();

        if first_name.is_empty() || last_name.is_empty() {
            return Err("First and last name are required".into());
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err(format!("'{}' is not a valid email address", email).into()),
        }
        if let Err(e) = validate_strong_password(&self.password) {
            let message = e
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Password is too weak".to_string());
            return Err(message.into());
        }

        Ok(Self {
            first_name,
            last_name,
            email,
            password: self.password,
        })
    }
}

/// Creates an active, verified admin user with a `super_admin` profile and
/// every permission.
pub async fn create_superuser(
    db: &PgPool,
    input: SuperuserInput,
) -> Result<Uuid, Box<dyn std::error::Error>> {
    let input = input.normalized()?;
    let hashed_password =
        hash_password(&input.password).map_err(|e| format!("Failed to hash password: {}", e.message()))?;

    let mut tx = db.begin().await?;

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (email, password, first_name, last_name, user_type,
                            is_active, is_email_verified, is_superuser)
         VALUES ($1, $2, $3, $4, 'admin', true, true, true)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(&input.email)
    .bind(&hashed_password)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .fetch_optional(&mut *tx)
    .await?;

    let user_id = match user_id {
        Some(id) => id,
        None => {
            tx.rollback().await?;
            return Err("A user with this email already exists".into());
        }
    };

    sqlx::query(
        "INSERT INTO admins (user_id, admin_level, permissions)
         VALUES ($1, 'super_admin', $2)",
    )
    .bind(user_id)
    .bind(permissions::all())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(user_id)
}

/// Deletes parent accounts still unverified `days` after sign-up. Profiles
/// go with them through the foreign key cascade.
pub async fn cleanup_unverified(db: &PgPool, days: i32) -> Result<u64, Box<dyn std::error::Error>> {
    if days < 1 {
        return Err("--days must be at least 1".into());
    }

    let deleted = sqlx::query(
        "DELETE FROM users
         WHERE user_type = 'parent'
           AND is_email_verified = false
           AND created_at < NOW() - make_interval(days => $1)",
    )
    .bind(days)
    .execute(db)
    .await?
    .rows_affected();

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: &str, password: &str) -> SuperuserInput {
        SuperuserInput {
            first_name: "  Chamari ".into(),
            last_name: "Perera".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_normalized_trims_and_lowercases() {
        let normalized = input(" Head@Nursery.LK ", "Str0ng!Pass").normalized().unwrap();
        assert_eq!(normalized.first_name, "Chamari");
        assert_eq!(normalized.email, "head@nursery.lk");
    }

    #[test]
    fn test_normalized_rejects_bad_email() {
        assert!(input("not-an-email", "Str0ng!Pass").normalized().is_err());
        assert!(input("@nursery.lk", "Str0ng!Pass").normalized().is_err());
    }

    #[test]
    fn test_normalized_rejects_weak_password() {
        let err = input("head@nursery.lk", "weak").normalized().unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters long.");
    }
}
