//! The fixed clinic transactions.
//!
//! Writes run inside one engine transaction each: the transaction is only
//! committed once every statement succeeded, and dropping it on an error path
//! rolls back anything already written.

use crate::error::{ClinicError, ClinicResult, ConstraintCategory};
use crate::model::{Examination, ExaminationReportRow, Owner, Pet, Record, Staff};
use crate::store::{self, ClinicStore};
use crate::validate::is_identifier;
use rusqlite::params;
use tracing::{debug, info};

/// Outcome of registering a pet together with its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub owner: Owner,
    pub pet: Pet,
    /// False when the owner was already on file.
    pub owner_created: bool,
}

fn begin(store: &mut ClinicStore) -> ClinicResult<rusqlite::Transaction<'_>> {
    store
        .connection_mut()
        .transaction()
        .map_err(|e| ClinicError::unavailable("cannot begin transaction", e))
}

fn commit(tx: rusqlite::Transaction<'_>) -> ClinicResult<()> {
    tx.commit()
        .map_err(|e| ClinicError::unavailable("cannot commit transaction", e))
}

fn reread<R: Record>(conn: &rusqlite::Connection, key: &str) -> ClinicResult<R> {
    store::find::<R>(conn, key)?.ok_or_else(|| ClinicError::NotFoundNoop {
        table: R::TABLE.to_string(),
        key: key.to_string(),
    })
}

/// Insert `owner` unless a row with its key exists, then insert `pet`.
pub fn register_owner_and_pet(
    store: &mut ClinicStore,
    owner: &Owner,
    pet: &Pet,
) -> ClinicResult<Registration> {
    let validate = store.config().validate_writes;
    let tx = begin(store)?;

    let owner_created = if store::exists::<Owner>(&tx, &owner.owner_no)? {
        debug!(owner = %owner.owner_no, "owner already on file");
        false
    } else {
        store::insert(&tx, owner, validate)?;
        true
    };
    store::insert(&tx, pet, validate)?;

    let registration = Registration {
        owner: reread(&tx, &owner.owner_no)?,
        pet: reread(&tx, &pet.pet_no)?,
        owner_created,
    };
    commit(tx)?;
    info!(owner = %owner.owner_no, pet = %pet.pet_no, owner_created, "registered pet");
    Ok(registration)
}

pub fn record_examination(store: &mut ClinicStore, exam: &Examination) -> ClinicResult<Examination> {
    let validate = store.config().validate_writes;
    let tx = begin(store)?;
    store::insert(&tx, exam, validate)?;
    let stored = reread(&tx, &exam.exam_no)?;
    commit(tx)?;
    info!(exam = %exam.exam_no, pet = %exam.pet_no, staff = %exam.staff_no, "recorded examination");
    Ok(stored)
}

/// Move a staff member to another clinic.
///
/// An unknown `staff_no` changes nothing and is reported as
/// [`ClinicError::NotFoundNoop`]; an unknown clinic is a foreign key
/// violation.
pub fn reassign_staff_clinic(
    store: &mut ClinicStore,
    staff_no: &str,
    clinic_no: &str,
) -> ClinicResult<Staff> {
    let validate = store.config().validate_writes;
    let tx = begin(store)?;
    let not_found = || ClinicError::NotFoundNoop {
        table: Staff::TABLE.to_string(),
        key: staff_no.to_string(),
    };

    if validate {
        if !store::exists::<Staff>(&tx, staff_no)? {
            return Err(not_found());
        }
        if !is_identifier(clinic_no, 'C') {
            return Err(ClinicError::violation(
                Staff::TABLE,
                "staff_foreign_key",
                ConstraintCategory::ForeignKey,
                format!("clinicNo '{}' cannot reference an existing row", clinic_no),
            ));
        }
    }

    let changed = tx
        .execute(
            "UPDATE Staff SET clinicNo = ?1 WHERE staffNo = ?2",
            params![clinic_no, staff_no],
        )
        .map_err(|e| ClinicError::from_store(Staff::TABLE, e))?;
    if changed == 0 {
        return Err(not_found());
    }
    let staff = reread::<Staff>(&tx, staff_no)?;
    commit(tx)?;
    info!(staff = %staff_no, clinic = %clinic_no, "reassigned staff member");
    Ok(staff)
}

/// Pets registered at `clinic_no`, in whatever order the store returns them.
pub fn pets_by_clinic(store: &ClinicStore, clinic_no: &str) -> ClinicResult<Vec<Pet>> {
    let conn = store.connection();
    let mut stmt = conn
        .prepare("SELECT * FROM Pet WHERE clinicNo = ?1")
        .map_err(|e| ClinicError::from_store(Pet::TABLE, e))?;
    let pets = stmt
        .query_map([clinic_no], Pet::from_row)
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .map_err(|e| ClinicError::from_store(Pet::TABLE, e))?;
    debug!(clinic = %clinic_no, count = pets.len(), "listed pets");
    Ok(pets)
}

/// Every examination performed by `staff_no`, joined with the examined pet.
pub fn examination_report(
    store: &ClinicStore,
    staff_no: &str,
) -> ClinicResult<Vec<ExaminationReportRow>> {
    let conn = store.connection();
    let mut stmt = conn
        .prepare(
            "SELECT e.examNo AS examNo, e.chiefComplaint AS chiefComplaint,
                    e.description AS description, e.dateSeen AS dateSeen,
                    e.actionsTaken AS actionsTaken, p.petName AS petName,
                    p.species AS species, p.breed AS breed, p.ownerNo AS ownerNo
             FROM Examination e
             JOIN Pet p ON e.petNo = p.petNo
             WHERE e.staffNo = ?1",
        )
        .map_err(|e| ClinicError::from_store(Examination::TABLE, e))?;
    let rows = stmt
        .query_map([staff_no], ExaminationReportRow::from_row)
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .map_err(|e| ClinicError::from_store(Examination::TABLE, e))?;
    debug!(staff = %staff_no, count = rows.len(), "built examination report");
    Ok(rows)
}
