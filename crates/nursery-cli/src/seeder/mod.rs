//! Development data: classes with primary teachers, parents and their
//! children enrolled into those classes.
//!
//! Every seeded account uses the [`SEED_EMAIL_DOMAIN`] and every seeded
//! class and student code starts with `SEED-`, which is how
//! [`clear_all`] finds them again.

pub mod children;
pub mod classes;
pub mod models;
pub mod users;

use chrono::{Datelike, Utc};
use nursery_core::hash_password;
use sqlx::PgPool;
use std::time::Instant;

pub use models::SeedConfig;

pub const SEED_EMAIL_DOMAIN: &str = "seed.nursery.test";
/// Password shared by every seeded account.
pub const SEED_PASSWORD: &str = "Password123!";

/// `($1, $2, ...), (...)` for `rows` rows of `columns` parameters each.
/// `suffix` is appended inside every tuple for constant columns.
pub fn values_placeholders(rows: usize, columns: usize, suffix: &str) -> String {
    (0..rows)
        .map(|row| {
            let params = (1..=columns)
                .map(|col| format!("${}", row * columns + col))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({}{})", params, suffix)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🌱 Seeding nursery data: {:?}", config);

    let password_hash = hash_password(SEED_PASSWORD)
        .map_err(|e| format!("Failed to hash password: {}", e.message()))?;
    let today = Utc::now().date_naive();
    let academic_year = format!("{}-{}", today.year(), today.year() + 1);

    let class_seeds = classes::generate_classes(config.classes);
    let teacher_seeds = users::generate_people("teacher", config.teachers);
    let parent_seeds = users::generate_people("parent", config.parents);
    let child_seeds =
        children::generate_children(config.parents, config.children_per_parent, today);

    let mut tx = db.begin().await?;
    let class_ids = classes::seed_classes(&mut tx, &class_seeds, &academic_year).await?;
    let teacher_ids = users::seed_teachers(&mut tx, &teacher_seeds, &password_hash).await?;
    classes::assign_teachers(&mut tx, &class_ids, &teacher_ids).await?;
    let parent_ids = users::seed_parents(&mut tx, &parent_seeds, &password_hash).await?;
    children::seed_children(
        &mut tx,
        &child_seeds,
        &parent_ids,
        &class_ids,
        classes::SEED_CLASS_CAPACITY as usize,
    )
    .await?;
    tx.commit().await?;

    println!("\n✅ Seeding finished in {:?}", start_time.elapsed());
    println!("   Seeded accounts sign in with password {}", SEED_PASSWORD);
    Ok(())
}

/// Removes seeded students, classes and accounts. Profiles, enrollments
/// and assignments cascade.
pub async fn clear_all(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;
    let students = sqlx::query("DELETE FROM students WHERE student_code LIKE 'SEED-%'")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let classes = sqlx::query("DELETE FROM classes WHERE class_code LIKE 'SEED-%'")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let users = sqlx::query("DELETE FROM users WHERE email LIKE '%@' || $1")
        .bind(SEED_EMAIL_DOMAIN)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;

    println!(
        "   ✓ Deleted {} students, {} classes and {} users in {:?}",
        students,
        classes,
        users,
        start_time.elapsed()
    );
    Ok(students + classes + users)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_placeholders() {
        assert_eq!(values_placeholders(2, 2, ""), "($1, $2), ($3, $4)");
        assert_eq!(values_placeholders(1, 3, ", true"), "($1, $2, $3, true)");
        assert_eq!(values_placeholders(0, 3, ""), "");
    }

    #[test]
    fn test_default_config() {
        let config = SeedConfig::default();
        assert_eq!(config.total_children(), 60);
    }
}
