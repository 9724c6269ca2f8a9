//! backend/src/domain/models/baby.rs

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::Gender;
use thiserror::Error;
use uuid::Uuid;

const MAX_NAME_LENGTH: usize = 100;
const MAX_AGE_YEARS: u32 = 10;

/// Domain model for a baby profile. Every activity and media item belongs to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baby {
    pub id: Uuid,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub profile_image_path: Option<String>,
    /// Kilograms
    pub weight: Option<f64>,
    /// Centimetres
    pub height: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reasons a baby profile is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BabyValidationError {
    #[error("Baby name cannot be empty")]
    EmptyName,
    #[error("Baby name cannot exceed {MAX_NAME_LENGTH} characters")]
    NameTooLong,
    #[error("Birth date cannot be in the future")]
    BirthDateInFuture,
    #[error("Birth date cannot be more than {MAX_AGE_YEARS} years ago")]
    BirthDateTooOld,
    #[error("Weight and height must be positive")]
    InvalidMeasurement,
}

/// Age of a baby on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BabyAge {
    /// Whole months since birth
    pub months: u32,
    /// Days past the last whole month
    pub days: u32,
    /// Total days since birth
    pub total_days: u32,
}

impl BabyAge {
    /// Compute the age of someone born on `birth_date` as of `today`.
    /// A birth date after `today` yields a zero age.
    pub fn between(birth_date: NaiveDate, today: NaiveDate) -> Self {
        if birth_date >= today {
            return Self { months: 0, days: 0, total_days: 0 };
        }

        let mut months = (today.year() - birth_date.year()) as u32 * 12 + today.month() - 1;
        months = months.saturating_sub(birth_date.month() - 1);
        let mut anniversary = add_months(birth_date, months);
        while anniversary > today && months > 0 {
            months -= 1;
            anniversary = add_months(birth_date, months);
        }

        Self {
            months,
            days: (today - anniversary).num_days() as u32,
            total_days: (today - birth_date).num_days() as u32,
        }
    }

    /// Short human readable age, e.g. "1 year 2 months", "5 months" or "12 days"
    pub fn display_string(&self) -> String {
        if self.months >= 12 {
            let years = self.months / 12;
            let remaining = self.months % 12;
            let year_part = format!("{} year{}", years, if years == 1 { "" } else { "s" });
            if remaining == 0 {
                year_part
            } else {
                format!("{} {} month{}", year_part, remaining, if remaining == 1 { "" } else { "s" })
            }
        } else if self.months > 0 {
            format!("{} month{}", self.months, if self.months == 1 { "" } else { "s" })
        } else {
            format!("{} day{}", self.total_days, if self.total_days == 1 { "" } else { "s" })
        }
    }
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

impl Baby {
    /// Build a new, validated baby profile
    pub fn new(
        name: &str,
        birth_date: NaiveDate,
        gender: Gender,
        now: DateTime<Utc>,
    ) -> Result<Self, BabyValidationError> {
        let baby = Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            birth_date,
            gender,
            profile_image_path: None,
            weight: None,
            height: None,
            created_at: now,
            updated_at: now,
        };
        baby.validate(now.date_naive())?;
        Ok(baby)
    }

    /// Check the profile against the rules applied on create and update
    pub fn validate(&self, today: NaiveDate) -> Result<(), BabyValidationError> {
        if self.name.trim().is_empty() {
            return Err(BabyValidationError::EmptyName);
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(BabyValidationError::NameTooLong);
        }
        if self.birth_date > today {
            return Err(BabyValidationError::BirthDateInFuture);
        }
        let oldest = today
            .checked_sub_months(Months::new(MAX_AGE_YEARS * 12))
            .unwrap_or(NaiveDate::MIN);
        if self.birth_date < oldest {
            return Err(BabyValidationError::BirthDateTooOld);
        }
        if self.weight.is_some_and(|w| w <= 0.0) || self.height.is_some_and(|h| h <= 0.0) {
            return Err(BabyValidationError::InvalidMeasurement);
        }
        Ok(())
    }

    pub fn age(&self, today: NaiveDate) -> BabyAge {
        BabyAge::between(self.birth_date, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_in_months_and_days() {
        let age = BabyAge::between(date(2024, 1, 15), date(2024, 3, 20));
        assert_eq!(age.months, 2);
        assert_eq!(age.days, 5);
        assert_eq!(age.display_string(), "2 months");
    }

    #[test]
    fn test_age_before_first_month_counts_days() {
        let age = BabyAge::between(date(2024, 3, 1), date(2024, 3, 13));
        assert_eq!(age.months, 0);
        assert_eq!(age.display_string(), "12 days");
    }

    #[test]
    fn test_age_handles_month_end_birthdays() {
        let age = BabyAge::between(date(2024, 1, 31), date(2024, 2, 28));
        assert_eq!(age.months, 0);
        assert_eq!(age.total_days, 28);
    }

    #[test]
    fn test_age_in_years() {
        let age = BabyAge::between(date(2022, 5, 1), date(2023, 7, 2));
        assert_eq!(age.months, 14);
        assert_eq!(age.display_string(), "1 year 2 months");
    }

    #[test]
    fn test_validation_rules() {
        let now = Utc::now();
        let today = now.date_naive();

        assert_eq!(
            Baby::new("  ", today, Gender::Female, now).unwrap_err(),
            BabyValidationError::EmptyName
        );
        assert_eq!(
            Baby::new("Mia", today + chrono::Duration::days(1), Gender::Female, now).unwrap_err(),
            BabyValidationError::BirthDateInFuture
        );
        assert_eq!(
            Baby::new("Mia", today - chrono::Duration::days(365 * 11), Gender::Female, now)
                .unwrap_err(),
            BabyValidationError::BirthDateTooOld
        );

        let baby = Baby::new(" Mia ", today, Gender::Female, now).unwrap();
        assert_eq!(baby.name, "Mia");
    }
}
