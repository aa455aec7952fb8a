//! Generated identifiers: teacher employee ids and student codes.

use nursery_core::AppError;
use sqlx::PgExecutor;
use anyhow::Context;

pub const EMPLOYEE_ID_PREFIX: &str = "TCH";
pub const STUDENT_CODE_PREFIX: &str = "STU";

pub fn format_employee_id(sequence: i64) -> String {
    format!("{}{:04}", EMPLOYEE_ID_PREFIX, sequence)
}

pub fn format_student_code(year: i32, sequence: i64) -> String {
    format!("{}{}{:04}", STUDENT_CODE_PREFIX, year, sequence)
}

/// Next free `TCH0001`-style id, one past the highest numeric suffix in use.
pub async fn next_employee_id<'e>(db: impl PgExecutor<'e>) -> Result<String, AppError> {
    let highest = sqlx::query_scalar::<_, i64>(
        r#"SELECT COALESCE(MAX(SUBSTRING(employee_id FROM 4)::BIGINT), 0)
           FROM teachers
           WHERE employee_id ~ '^TCH[0-9]+$'"#,
    )
    .fetch_one(db)
    .await
    .context("Failed to compute next employee id")
    .map_err(AppError::database)?;

    Ok(format_employee_id(highest + 1))
}

/// Next free `STU{year}0001`-style code for the given year.
pub async fn next_student_code<'e>(db: impl PgExecutor<'e>, year: i32) -> Result<String, AppError> {
    let prefix = format!("{}{}", STUDENT_CODE_PREFIX, year);
    let highest = sqlx::query_scalar::<_, i64>(
        r#"SELECT COALESCE(MAX(SUBSTRING(student_code FROM $2)::BIGINT), 0)
           FROM students
           WHERE student_code ~ ('^' || $1 || '[0-9]+$')"#,
    )
    .bind(&prefix)
    .bind(prefix.len() as i32 + 1)
    .fetch_one(db)
    .await
    .context("Failed to compute next student code")
    .map_err(AppError::database)?;

    Ok(format_student_code(year, highest + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_employee_id() {
        assert_eq!(format_employee_id(1), "TCH0001");
        assert_eq!(format_employee_id(42), "TCH0042");
        assert_eq!(format_employee_id(12345), "TCH12345");
    }

    #[test]
    fn test_format_student_code() {
        assert_eq!(format_student_code(2025, 1), "STU20250001");
        assert_eq!(format_student_code(2026, 130), "STU20260130");
    }
}
