//! Teacher and parent accounts with their profiles.

use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::{Postgres, Transaction};
use std::time::Instant;
use uuid::Uuid;

use super::models::PersonSeed;
use super::{SEED_EMAIL_DOMAIN, values_placeholders};

/// `count` people whose emails are unique within the batch.
pub fn generate_people(role_prefix: &str, count: usize) -> Vec<PersonSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let email = format!(
                "{}.{}+{}{}@{}",
                first_name.to_lowercase(),
                last_name.to_lowercase(),
                role_prefix,
                idx,
                SEED_EMAIL_DOMAIN
            );
            let phone_number = format!("07{:08}", (0..100_000_000u32).fake::<u32>());

            PersonSeed {
                first_name,
                last_name,
                email,
                phone_number,
            }
        })
        .collect()
}

async fn insert_users(
    tx: &mut Transaction<'static, Postgres>,
    people: &[PersonSeed],
    user_type: &str,
    password_hash: &str,
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    if people.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "INSERT INTO users (email, password, first_name, last_name, phone_number,
                            user_type, is_active, is_email_verified)
         VALUES {}
         RETURNING id",
        values_placeholders(people.len(), 6, ", true, true")
    );

    let mut query = sqlx::query_scalar::<_, Uuid>(&sql);
    for person in people {
        query = query
            .bind(&person.email)
            .bind(password_hash)
            .bind(&person.first_name)
            .bind(&person.last_name)
            .bind(&person.phone_number)
            .bind(user_type);
    }

    Ok(query.fetch_all(&mut **tx).await?)
}

/// Returns the `teachers.id` of each seeded teacher.
pub async fn seed_teachers(
    tx: &mut Transaction<'static, Postgres>,
    people: &[PersonSeed],
    password_hash: &str,
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("👩‍🏫 Seeding {} teachers...", people.len());

    let user_ids = insert_users(tx, people, "teacher", password_hash).await?;
    let mut teacher_ids = Vec::with_capacity(user_ids.len());
    for (idx, user_id) in user_ids.iter().enumerate() {
        let teacher_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO teachers (user_id, employee_id, subjects, experience_years,
                                   password_change_required)
             VALUES ($1, $2, 'Early Childhood Education', $3, false)
             RETURNING id",
        )
        .bind(user_id)
        .bind(format!("SEED-T{:04}", idx + 1))
        .bind((0..15).fake::<i32>())
        .fetch_one(&mut **tx)
        .await?;
        teacher_ids.push(teacher_id);
    }

    println!(
        "   ✓ Inserted {} teachers in {:?}",
        teacher_ids.len(),
        start_time.elapsed()
    );
    Ok(teacher_ids)
}

/// Returns the `parents.id` of each seeded parent.
pub async fn seed_parents(
    tx: &mut Transaction<'static, Postgres>,
    people: &[PersonSeed],
    password_hash: &str,
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("👪 Seeding {} parents...", people.len());

    let user_ids = insert_users(tx, people, "parent", password_hash).await?;
    let parent_ids = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO parents (user_id, emergency_contact)
         SELECT u.id, u.phone_number FROM users u WHERE u.id = ANY($1)
         RETURNING id",
    )
    .bind(&user_ids)
    .fetch_all(&mut **tx)
    .await?;

    println!(
        "   ✓ Inserted {} parents in {:?}",
        parent_ids.len(),
        start_time.elapsed()
    );
    Ok(parent_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_emails_use_seed_domain() {
        let people = generate_people("parent", 20);
        assert_eq!(people.len(), 20);
        assert!(
            people
                .iter()
                .all(|p| p.email.ends_with(&format!("@{}", SEED_EMAIL_DOMAIN)))
        );
    }

    #[test]
    fn test_generated_emails_are_unique() {
        let people = generate_people("teacher", 50);
        let mut emails: Vec<_> = people.iter().map(|p| p.email.clone()).collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), 50);
    }
}
