//! Application-side checks that mirror the store's check constraints.
//!
//! Every rejection carries the same constraint name the engine would report
//! for the same field, so callers cannot tell which layer refused a write.
//! Uniqueness and foreign key existence are left to the store.

use crate::error::{ClinicError, ClinicResult, ConstraintCategory};
use crate::model::{Clinic, Examination, Owner, Pet, Position, Record, Species, Staff};
use crate::schema::constraint_name;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z])[0-9]{6}$").unwrap());
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{3}-[0-9]{3}-[0-9]{4}$").unwrap());

pub const MAX_TEXT_LEN: usize = 500;

pub trait Validate {
    fn validate(&self) -> ClinicResult<()>;
}

struct Checker {
    table: &'static str,
}

impl Checker {
    fn for_record<R: Record>() -> Self {
        Self { table: R::TABLE }
    }

    fn fail(&self, column: &str, category: ConstraintCategory, detail: String) -> ClinicError {
        ClinicError::violation(
            self.table,
            constraint_name(self.table, column, category),
            category,
            detail,
        )
    }

    fn identifier(&self, column: &str, value: &str, prefix: char) -> ClinicResult<()> {
        if is_identifier(value, prefix) {
            Ok(())
        } else {
            Err(self.fail(
                column,
                ConstraintCategory::Format,
                format!("{} '{}' must be '{}' followed by six digits", column, value, prefix),
            ))
        }
    }

    /// Reference columns have no check of their own in the store; a value in
    /// the wrong format can never match a parent row.
    fn reference(&self, column: &str, value: &str, prefix: char) -> ClinicResult<()> {
        if is_identifier(value, prefix) {
            Ok(())
        } else {
            Err(ClinicError::violation(
                self.table,
                format!("{}_foreign_key", self.table.to_lowercase()),
                ConstraintCategory::ForeignKey,
                format!("{} '{}' cannot reference an existing row", column, value),
            ))
        }
    }

    fn name(&self, column: &str, value: &str) -> ClinicResult<()> {
        if value.chars().any(|c| c.is_ascii_digit() || c == '\0') {
            Err(self.fail(
                column,
                ConstraintCategory::Format,
                format!("{} '{}' must not contain digits or NUL", column, value.escape_debug()),
            ))
        } else {
            Ok(())
        }
    }

    fn phone(&self, column: &str, value: &str) -> ClinicResult<()> {
        if PHONE.is_match(value) {
            Ok(())
        } else {
            Err(self.fail(
                column,
                ConstraintCategory::Format,
                format!("{} '{}' must look like XXX-XXX-XXXX", column, value),
            ))
        }
    }

    fn date(&self, column: &str, value: Option<&str>) -> ClinicResult<()> {
        match value {
            Some(v) if !is_calendar_date(v) => Err(self.fail(
                column,
                ConstraintCategory::Format,
                format!("{} '{}' is not a valid YYYY-MM-DD date", column, v),
            )),
            _ => Ok(()),
        }
    }

    fn max_len(&self, column: &str, value: Option<&str>) -> ClinicResult<()> {
        match value {
            Some(v) if v.chars().count() > MAX_TEXT_LEN || v.contains('\0') => Err(self.fail(
                column,
                ConstraintCategory::Length,
                format!("{} must be at most {} characters without NUL", column, MAX_TEXT_LEN),
            )),
            _ => Ok(()),
        }
    }

    fn one_of<T: std::str::FromStr>(&self, column: &str, value: Option<&str>) -> ClinicResult<()>
    where
        T::Err: std::fmt::Display,
    {
        match value.map(str::parse::<T>) {
            Some(Err(e)) => Err(self.fail(column, ConstraintCategory::Enum, e.to_string())),
            _ => Ok(()),
        }
    }
}

pub fn is_identifier(value: &str, prefix: char) -> bool {
    IDENTIFIER
        .captures(value)
        .and_then(|c| c.get(1))
        .map_or(false, |m| m.as_str().starts_with(prefix))
}

/// `YYYY-MM-DD` naming a real calendar day.
pub fn is_calendar_date(value: &str) -> bool {
    value.len() == 10
        && NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|d| d.format("%Y-%m-%d").to_string() == value)
            .unwrap_or(false)
}

impl Validate for Clinic {
    fn validate(&self) -> ClinicResult<()> {
        let c = Checker::for_record::<Self>();
        c.identifier("clinicNo", &self.clinic_no, 'C')?;
        c.name("clinicName", &self.clinic_name)?;
        c.phone("clinicPhone", &self.clinic_phone)
    }
}

impl Validate for Owner {
    fn validate(&self) -> ClinicResult<()> {
        let c = Checker::for_record::<Self>();
        c.identifier("ownerNo", &self.owner_no, 'O')?;
        c.name("ownerName", &self.owner_name)?;
        c.phone("ownerPhone", &self.owner_phone)
    }
}

impl Validate for Staff {
    fn validate(&self) -> ClinicResult<()> {
        let c = Checker::for_record::<Self>();
        c.identifier("staffNo", &self.staff_no, 'S')?;
        c.name("staffName", &self.staff_name)?;
        c.phone("staffPhone", &self.staff_phone)?;
        c.date("dateOfBirth", self.date_of_birth.as_deref())?;
        c.one_of::<Position>("position", self.position.as_deref())?;
        if let Some(salary) = self.salary {
            if !(salary.is_finite() && salary > 0.0) {
                return Err(c.fail(
                    "salary",
                    ConstraintCategory::Range,
                    format!("salary {} must be a finite amount greater than zero", salary),
                ));
            }
        }
        c.reference("clinicNo", &self.clinic_no, 'C')
    }
}

impl Validate for Pet {
    fn validate(&self) -> ClinicResult<()> {
        let c = Checker::for_record::<Self>();
        c.identifier("petNo", &self.pet_no, 'P')?;
        c.name("petName", &self.pet_name)?;
        c.date("petDateOfBirth", Some(self.pet_date_of_birth.as_str()))?;
        c.one_of::<Species>("species", Some(self.species.as_str()))?;
        c.reference("ownerNo", &self.owner_no, 'O')?;
        c.reference("clinicNo", &self.clinic_no, 'C')
    }
}

impl Validate for Examination {
    fn validate(&self) -> ClinicResult<()> {
        let c = Checker::for_record::<Self>();
        c.identifier("examNo", &self.exam_no, 'E')?;
        c.max_len("chiefComplaint", Some(self.chief_complaint.as_str()))?;
        c.max_len("description", self.description.as_deref())?;
        c.date("dateSeen", Some(self.date_seen.as_str()))?;
        c.reference("petNo", &self.pet_no, 'P')?;
        c.reference("staffNo", &self.staff_no, 'S')
    }
}
