//! Record types for the five clinic tables.
//!
//! Dates, identifiers and enum fields are kept as the text that is bound to
//! the store, so a malformed value can still reach the engine and be rejected
//! there. `Species` and `Position` name the closed value sets.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Row, ToSql};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single cell, used both as a bound parameter and as a reported value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Real(f64),
    Text(String),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self {
            Value::Null => ValueRef::Null,
            Value::Real(r) => ValueRef::Real(*r),
            Value::Text(s) => ValueRef::Text(s.as_bytes()),
        }))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Real(r) if r.fract() == 0.0 && r.is_finite() => write!(f, "{:.1}", r),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Dog,
    Cat,
    Bird,
    Rabbit,
    Other,
}

impl Species {
    pub const ALL: [Species; 5] = [
        Species::Dog,
        Species::Cat,
        Species::Bird,
        Species::Rabbit,
        Species::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Dog => "Dog",
            Species::Cat => "Cat",
            Species::Bird => "Bird",
            Species::Rabbit => "Rabbit",
            Species::Other => "Other",
        }
    }
}

impl FromStr for Species {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Species::ALL
            .into_iter()
            .find(|species| species.as_str() == s)
            .ok_or_else(|| format!("'{}' is not a recognised species", s))
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Veterinarian,
    Nurse,
    Technician,
    Receptionist,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Veterinarian,
        Position::Nurse,
        Position::Technician,
        Position::Receptionist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Veterinarian => "Veterinarian",
            Position::Nurse => "Nurse",
            Position::Technician => "Technician",
            Position::Receptionist => "Receptionist",
        }
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::ALL
            .into_iter()
            .find(|position| position.as_str() == s)
            .ok_or_else(|| format!("'{}' is not a recognised staff position", s))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row type bound to one clinic table.
///
/// `COLUMNS` lists the table's columns in declaration order, primary key
/// first; `values` returns the cells in the same order.
pub trait Record: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> &str;
    fn values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub clinic_no: String,
    pub clinic_name: String,
    pub clinic_address: String,
    pub clinic_phone: String,
}

impl Clinic {
    pub fn new(no: &str, name: &str, address: &str, phone: &str) -> Self {
        Self {
            clinic_no: no.to_string(),
            clinic_name: name.to_string(),
            clinic_address: address.to_string(),
            clinic_phone: phone.to_string(),
        }
    }
}

impl Record for Clinic {
    const TABLE: &'static str = "Clinic";
    const COLUMNS: &'static [&'static str] =
        &["clinicNo", "clinicName", "clinicAddress", "clinicPhone"];

    fn key(&self) -> &str {
        &self.clinic_no
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.clinic_no.as_str().into(),
            self.clinic_name.as_str().into(),
            self.clinic_address.as_str().into(),
            self.clinic_phone.as_str().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            clinic_no: row.get("clinicNo")?,
            clinic_name: row.get("clinicName")?,
            clinic_address: row.get("clinicAddress")?,
            clinic_phone: row.get("clinicPhone")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub owner_no: String,
    pub owner_name: String,
    pub owner_address: String,
    pub owner_phone: String,
}

impl Owner {
    pub fn new(no: &str, name: &str, address: &str, phone: &str) -> Self {
        Self {
            owner_no: no.to_string(),
            owner_name: name.to_string(),
            owner_address: address.to_string(),
            owner_phone: phone.to_string(),
        }
    }
}

impl Record for Owner {
    const TABLE: &'static str = "Owner";
    const COLUMNS: &'static [&'static str] = &["ownerNo", "ownerName", "ownerAddress", "ownerPhone"];

    fn key(&self) -> &str {
        &self.owner_no
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.owner_no.as_str().into(),
            self.owner_name.as_str().into(),
            self.owner_address.as_str().into(),
            self.owner_phone.as_str().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            owner_no: row.get("ownerNo")?,
            owner_name: row.get("ownerName")?,
            owner_address: row.get("ownerAddress")?,
            owner_phone: row.get("ownerPhone")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub staff_no: String,
    pub staff_name: String,
    pub staff_address: String,
    pub staff_phone: String,
    pub date_of_birth: Option<String>,
    pub position: Option<String>,
    pub salary: Option<f64>,
    pub clinic_no: String,
}

impl Record for Staff {
    const TABLE: &'static str = "Staff";
    const COLUMNS: &'static [&'static str] = &[
        "staffNo",
        "staffName",
        "staffAddress",
        "staffPhone",
        "dateOfBirth",
        "position",
        "salary",
        "clinicNo",
    ];

    fn key(&self) -> &str {
        &self.staff_no
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.staff_no.as_str().into(),
            self.staff_name.as_str().into(),
            self.staff_address.as_str().into(),
            self.staff_phone.as_str().into(),
            self.date_of_birth.clone().into(),
            self.position.clone().into(),
            self.salary.into(),
            self.clinic_no.as_str().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            staff_no: row.get("staffNo")?,
            staff_name: row.get("staffName")?,
            staff_address: row.get("staffAddress")?,
            staff_phone: row.get("staffPhone")?,
            date_of_birth: row.get("dateOfBirth")?,
            position: row.get("position")?,
            salary: row.get("salary")?,
            clinic_no: row.get("clinicNo")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub pet_no: String,
    pub pet_name: String,
    pub pet_date_of_birth: String,
    pub species: String,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub owner_no: String,
    pub clinic_no: String,
}

impl Record for Pet {
    const TABLE: &'static str = "Pet";
    const COLUMNS: &'static [&'static str] = &[
        "petNo",
        "petName",
        "petDateOfBirth",
        "species",
        "breed",
        "color",
        "ownerNo",
        "clinicNo",
    ];

    fn key(&self) -> &str {
        &self.pet_no
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.pet_no.as_str().into(),
            self.pet_name.as_str().into(),
            self.pet_date_of_birth.as_str().into(),
            self.species.as_str().into(),
            self.breed.clone().into(),
            self.color.clone().into(),
            self.owner_no.as_str().into(),
            self.clinic_no.as_str().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            pet_no: row.get("petNo")?,
            pet_name: row.get("petName")?,
            pet_date_of_birth: row.get("petDateOfBirth")?,
            species: row.get("species")?,
            breed: row.get("breed")?,
            color: row.get("color")?,
            owner_no: row.get("ownerNo")?,
            clinic_no: row.get("clinicNo")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Examination {
    pub exam_no: String,
    pub chief_complaint: String,
    pub description: Option<String>,
    pub date_seen: String,
    pub actions_taken: Option<String>,
    pub pet_no: String,
    pub staff_no: String,
}

impl Record for Examination {
    const TABLE: &'static str = "Examination";
    const COLUMNS: &'static [&'static str] = &[
        "examNo",
        "chiefComplaint",
        "description",
        "dateSeen",
        "actionsTaken",
        "petNo",
        "staffNo",
    ];

    fn key(&self) -> &str {
        &self.exam_no
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.exam_no.as_str().into(),
            self.chief_complaint.as_str().into(),
            self.description.clone().into(),
            self.date_seen.as_str().into(),
            self.actions_taken.clone().into(),
            self.pet_no.as_str().into(),
            self.staff_no.as_str().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            exam_no: row.get("examNo")?,
            chief_complaint: row.get("chiefComplaint")?,
            description: row.get("description")?,
            date_seen: row.get("dateSeen")?,
            actions_taken: row.get("actionsTaken")?,
            pet_no: row.get("petNo")?,
            staff_no: row.get("staffNo")?,
        })
    }
}

/// One line of the examinations-by-staff report: the examination joined
/// with the examined pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExaminationReportRow {
    pub exam_no: String,
    pub chief_complaint: String,
    pub description: Option<String>,
    pub date_seen: String,
    pub actions_taken: Option<String>,
    pub pet_name: String,
    pub species: String,
    pub breed: Option<String>,
    pub owner_no: String,
}

impl ExaminationReportRow {
    pub const COLUMNS: &'static [&'static str] = &[
        "examNo",
        "chiefComplaint",
        "description",
        "dateSeen",
        "actionsTaken",
        "petName",
        "species",
        "breed",
        "ownerNo",
    ];

    pub fn values(&self) -> Vec<Value> {
        vec![
            self.exam_no.as_str().into(),
            self.chief_complaint.as_str().into(),
            self.description.clone().into(),
            self.date_seen.as_str().into(),
            self.actions_taken.clone().into(),
            self.pet_name.as_str().into(),
            self.species.as_str().into(),
            self.breed.clone().into(),
            self.owner_no.as_str().into(),
        ]
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            exam_no: row.get("examNo")?,
            chief_complaint: row.get("chiefComplaint")?,
            description: row.get("description")?,
            date_seen: row.get("dateSeen")?,
            actions_taken: row.get("actionsTaken")?,
            pet_name: row.get("petName")?,
            species: row.get("species")?,
            breed: row.get("breed")?,
            owner_no: row.get("ownerNo")?,
        })
    }
}
