//! Seed records and the knobs controlling how many are generated.

use chrono::NaiveDate;
use nursery_models::{Gender, RelationshipType};

pub struct ClassSeed {
    pub class_name: String,
    pub class_code: String,
    pub age_group: String,
    pub capacity: i32,
    pub room_number: String,
}

/// A teacher or parent account.
pub struct PersonSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

pub struct ChildSeed {
    pub student_name: String,
    pub student_code: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    /// Index into the seeded parents
    pub parent_idx: usize,
    pub relationship: RelationshipType,
}

#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub classes: usize,
    pub teachers: usize,
    pub parents: usize,
    pub children_per_parent: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            classes: 4,
            teachers: 6,
            parents: 30,
            children_per_parent: 2,
        }
    }
}

impl SeedConfig {
    pub fn total_children(&self) -> usize {
        self.parents * self.children_per_parent
    }
}
