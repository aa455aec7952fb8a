//! Students linked to seeded parents and enrolled round-robin into classes.

use chrono::{Duration, NaiveDate};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use nursery_models::{Gender, RelationshipType};
use rayon::prelude::*;
use sqlx::{Postgres, Transaction};
use std::time::Instant;
use uuid::Uuid;

use super::models::ChildSeed;
use super::values_placeholders;

/// Children are between two and five years old on `today`.
pub fn generate_children(parents: usize, per_parent: usize, today: NaiveDate) -> Vec<ChildSeed> {
    (0..parents * per_parent)
        .into_par_iter()
        .map(|idx| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let age_days: i64 = (2 * 365..5 * 365).fake();
            let gender = if idx % 2 == 0 {
                Gender::Female
            } else {
                Gender::Male
            };
            let relationship = match (0..3).fake::<u8>() {
                0 => RelationshipType::Mother,
                1 => RelationshipType::Father,
                _ => RelationshipType::Guardian,
            };

            ChildSeed {
                student_name: format!("{} {}", first_name, last_name),
                student_code: format!("SEED-S{:05}", idx + 1),
                date_of_birth: today - Duration::days(age_days),
                gender,
                parent_idx: idx / per_parent.max(1),
                relationship,
            }
        })
        .collect()
}

/// Class index for each child, filling classes in turn and leaving the
/// overflow unenrolled.
pub fn plan_enrollments(children: usize, classes: usize, capacity: usize) -> Vec<Option<usize>> {
    if classes == 0 {
        return vec![None; children];
    }
    (0..children)
        .map(|idx| {
            let class_idx = idx % classes;
            let seat = idx / classes;
            (seat < capacity).then_some(class_idx)
        })
        .collect()
}

pub async fn seed_children(
    tx: &mut Transaction<'static, Postgres>,
    children: &[ChildSeed],
    parent_ids: &[Uuid],
    class_ids: &[Uuid],
    class_capacity: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    if children.is_empty() {
        return Ok(0);
    }
    let start_time = Instant::now();
    println!("🧒 Seeding {} children...", children.len());

    const BATCH_SIZE: usize = 1000;
    let mut student_ids = Vec::with_capacity(children.len());
    for chunk in children.chunks(BATCH_SIZE) {
        let sql = format!(
            "INSERT INTO students (student_name, student_code, date_of_birth, gender)
             VALUES {}
             RETURNING id",
            values_placeholders(chunk.len(), 4, "")
        );
        let mut query = sqlx::query_scalar::<_, Uuid>(&sql);
        for child in chunk {
            query = query
                .bind(&child.student_name)
                .bind(&child.student_code)
                .bind(child.date_of_birth)
                .bind(child.gender);
        }
        student_ids.extend(query.fetch_all(&mut **tx).await?);
    }

    for (child, student_id) in children.iter().zip(&student_ids) {
        let Some(parent_id) = parent_ids.get(child.parent_idx) else {
            continue;
        };
        sqlx::query(
            "INSERT INTO parent_student_relationships
                 (parent_id, student_id, relationship_type, is_primary_contact)
             VALUES ($1, $2, $3, true)",
        )
        .bind(parent_id)
        .bind(student_id)
        .bind(child.relationship)
        .execute(&mut **tx)
        .await?;
    }

    let plan = plan_enrollments(student_ids.len(), class_ids.len(), class_capacity);
    let mut enrolled = 0;
    for (student_id, class_idx) in student_ids.iter().zip(plan) {
        let Some(class_idx) = class_idx else {
            continue;
        };
        sqlx::query("INSERT INTO class_student_enrollments (class_id, student_id) VALUES ($1, $2)")
            .bind(class_ids[class_idx])
            .bind(student_id)
            .execute(&mut **tx)
            .await?;
        enrolled += 1;
    }

    println!(
        "   ✓ Inserted {} children ({} enrolled) in {:?}",
        student_ids.len(),
        enrolled,
        start_time.elapsed()
    );
    Ok(enrolled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_ages_and_parents() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let children = generate_children(3, 2, today);
        assert_eq!(children.len(), 6);
        assert_eq!(children[5].parent_idx, 2);
        for child in &children {
            let age_days = (today - child.date_of_birth).num_days();
            assert!((2 * 365..5 * 365).contains(&age_days));
        }
    }

    #[test]
    fn test_plan_enrollments_respects_capacity() {
        let plan = plan_enrollments(7, 2, 3);
        assert_eq!(
            plan,
            vec![Some(0), Some(1), Some(0), Some(1), Some(0), Some(1), None]
        );
        assert_eq!(plan_enrollments(2, 0, 10), vec![None, None]);
    }
}
