//! Classes and their primary teachers.

use sqlx::{Postgres, Transaction};
use std::time::Instant;
use uuid::Uuid;

use super::models::ClassSeed;
use super::values_placeholders;

const CLASS_NAMES: [&str; 8] = [
    "Butterflies",
    "Sunflowers",
    "Little Stars",
    "Rainbows",
    "Ladybirds",
    "Busy Bees",
    "Dolphins",
    "Owls",
];

const AGE_GROUPS: [&str; 3] = ["2-3 years", "3-4 years", "4-5 years"];

pub const SEED_CLASS_CAPACITY: i32 = 20;

pub fn generate_classes(count: usize) -> Vec<ClassSeed> {
    (0..count)
        .map(|idx| {
            let base = CLASS_NAMES[idx % CLASS_NAMES.len()];
            let round = idx / CLASS_NAMES.len();
            let class_name = if round == 0 {
                base.to_string()
            } else {
                format!("{} {}", base, round + 1)
            };

            ClassSeed {
                class_name,
                class_code: format!("SEED-C{:02}", idx + 1),
                age_group: AGE_GROUPS[idx % AGE_GROUPS.len()].to_string(),
                capacity: SEED_CLASS_CAPACITY,
                room_number: format!("R{}", 101 + idx),
            }
        })
        .collect()
}

pub async fn seed_classes(
    tx: &mut Transaction<'static, Postgres>,
    classes: &[ClassSeed],
    academic_year: &str,
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    if classes.is_empty() {
        return Ok(Vec::new());
    }
    let start_time = Instant::now();
    println!("🏫 Seeding {} classes...", classes.len());

    let sql = format!(
        "INSERT INTO classes (class_name, class_code, age_group, capacity, room_number, academic_year)
         VALUES {}
         RETURNING id",
        values_placeholders(classes.len(), 6, "")
    );
    let mut query = sqlx::query_scalar::<_, Uuid>(&sql);
    for class in classes {
        query = query
            .bind(&class.class_name)
            .bind(&class.class_code)
            .bind(&class.age_group)
            .bind(class.capacity)
            .bind(&class.room_number)
            .bind(academic_year);
    }
    let ids = query.fetch_all(&mut **tx).await?;

    println!(
        "   ✓ Inserted {} classes in {:?}",
        ids.len(),
        start_time.elapsed()
    );
    Ok(ids)
}

/// Gives every class a primary teacher, cycling through the teachers.
pub async fn assign_teachers(
    tx: &mut Transaction<'static, Postgres>,
    class_ids: &[Uuid],
    teacher_ids: &[Uuid],
) -> Result<(), Box<dyn std::error::Error>> {
    if teacher_ids.is_empty() {
        return Ok(());
    }
    for (idx, class_id) in class_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO class_teacher_assignments (class_id, teacher_id, role)
             VALUES ($1, $2, 'primary')",
        )
        .bind(class_id)
        .bind(teacher_ids[idx % teacher_ids.len()])
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_classes_unique_names_and_codes() {
        let classes = generate_classes(10);
        assert_eq!(classes[0].class_name, "Butterflies");
        assert_eq!(classes[8].class_name, "Butterflies 2");
        assert_eq!(classes[9].class_code, "SEED-C10");
        assert!(classes.iter().all(|c| c.capacity == SEED_CLASS_CAPACITY));
    }
}
