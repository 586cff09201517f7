//! The fixed demonstration run: schema, seed data, the five transactions and
//! a few writes that the store must refuse.

use crate::error::{ClinicError, ClinicResult};
use crate::model::{Examination, Owner, Pet};
use crate::report::{describe, Reporter, ResultSet};
use crate::seed::{self, SeedData};
use crate::store::ClinicStore;
use crate::transactions;
use std::io::Write;
use tracing::{info, warn};

/// Tally of the transactions attempted in a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Record a per-transaction outcome. Fatal errors are handed back so the
    /// run stops; anything else is reported and the run continues.
    fn settle<T, W: Write>(
        &mut self,
        reporter: &mut Reporter<W>,
        context: &str,
        outcome: ClinicResult<T>,
    ) -> ClinicResult<Option<T>> {
        match outcome {
            Ok(value) => {
                self.succeeded += 1;
                Ok(Some(value))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.failed += 1;
                warn!(context, error = %describe(&e), "transaction failed");
                reporter.failure(context, &e)?;
                Ok(None)
            }
        }
    }
}

pub fn new_owner() -> Owner {
    Owner::new(
        "O000006",
        "Karen Taylor",
        "606 Sixth St, Philadelphia, PA 19102",
        "215-555-1212",
    )
}

pub fn new_pet() -> Pet {
    Pet {
        pet_no: "P000006".into(),
        pet_name: "Bella".into(),
        pet_date_of_birth: "2021-06-15".into(),
        species: "Dog".into(),
        breed: Some("Poodle".into()),
        color: Some("White".into()),
        owner_no: "O000006".into(),
        clinic_no: "C000001".into(),
    }
}

/// Bad name, impossible date, unknown species and a missing owner.
pub fn erroneous_pet() -> Pet {
    Pet {
        pet_no: "P000007".into(),
        pet_name: "123InvalidName".into(),
        pet_date_of_birth: "2021-15-15".into(),
        species: "Dinosaur".into(),
        breed: Some("T-Rex".into()),
        color: Some("Green".into()),
        owner_no: "O000007".into(),
        clinic_no: "C000001".into(),
    }
}

pub fn new_examination() -> Examination {
    Examination {
        exam_no: "E000006".into(),
        chief_complaint: "Skin rash".into(),
        description: Some("Examined skin for dermatitis".into()),
        date_seen: "2023-06-10".into(),
        actions_taken: Some("Prescribed topical ointment".into()),
        pet_no: "P000006".into(),
        staff_no: "S000001".into(),
    }
}

pub fn erroneous_examination() -> Examination {
    Examination {
        exam_no: "E000007".into(),
        chief_complaint: "Cough".into(),
        description: Some("Pet not feeling well and exhibits constant coughing.".into()),
        date_seen: "2023-13-40".into(),
        actions_taken: Some("No action".into()),
        pet_no: "P000006".into(),
        staff_no: "S000001".into(),
    }
}

const REASSIGNED_STAFF: &str = "S000003";
const TARGET_CLINIC: &str = "C000002";
const MISSING_CLINIC: &str = "C999999";
const LISTED_CLINIC: &str = "C000001";
const REPORTED_STAFF: &str = "S000001";

/// Prepare the store and run every step, writing results to `reporter`.
///
/// Only fatal errors are returned; rejected writes are part of the output.
pub fn run<W: Write>(store: &mut ClinicStore, reporter: &mut Reporter<W>) -> ClinicResult<RunSummary> {
    store.ensure_schema()?;
    reporter.message("Database schema with constraints is in place.")?;

    let seeded = seed::seed(store, &SeedData::baseline())?;
    reporter.message(&format!(
        "Seed data: {} rows inserted, {} already present.",
        seeded.inserted, seeded.skipped
    ))?;
    for failure in &seeded.failures {
        reporter.failure(&format!("Seed row {} {}", failure.table, failure.key), &failure.error)?;
    }

    let mut summary = RunSummary::default();

    reporter.section("Transaction 1: Add a New Pet")?;
    let outcome = transactions::register_owner_and_pet(store, &new_owner(), &new_pet());
    if let Some(registration) = summary.settle(reporter, "Failed to add new pet", outcome)? {
        if registration.owner_created {
            reporter.message("New owner added successfully.")?;
        } else {
            reporter.message("Owner already exists.")?;
        }
        reporter.message("New pet added successfully.")?;
        reporter.table("New Pet Details", &ResultSet::from_rows(&[registration.pet]))?;
    }

    reporter.section("Attempting to Add Erroneous Pet Data (Should Fail)")?;
    let outcome = store.insert(&erroneous_pet());
    if summary
        .settle(reporter, "Failed to add erroneous pet due to constraint violation", outcome)?
        .is_some()
    {
        reporter.message("Erroneous pet added successfully (This should not happen).")?;
    }

    reporter.section("Transaction 2: Record an Examination")?;
    let outcome = transactions::record_examination(store, &new_examination());
    if let Some(exam) = summary.settle(reporter, "Failed to record new examination", outcome)? {
        reporter.message("New examination recorded successfully.")?;
        reporter.table("New Examination Details", &ResultSet::from_rows(&[exam]))?;
    }

    reporter.section("Attempting to Record Erroneous Examination Data (Should Fail)")?;
    let outcome = transactions::record_examination(store, &erroneous_examination());
    if summary
        .settle(
            reporter,
            "Failed to record erroneous examination due to constraint violation",
            outcome,
        )?
        .is_some()
    {
        reporter.message("Erroneous examination recorded successfully (This should not happen).")?;
    }

    reporter.section("Transaction 3: Update Staff Clinic Assignment")?;
    let outcome = transactions::reassign_staff_clinic(store, REASSIGNED_STAFF, TARGET_CLINIC);
    if let Some(staff) = summary.settle(
        reporter,
        "Failed to update staff member's clinic assignment",
        outcome,
    )? {
        reporter.message("Staff member's clinic assignment updated.")?;
        reporter.table("Updated Staff Member Details", &ResultSet::from_rows(&[staff]))?;
    }

    reporter.section("Attempting to Update Staff with Invalid ClinicNo (Should Fail)")?;
    let outcome = transactions::reassign_staff_clinic(store, REASSIGNED_STAFF, MISSING_CLINIC);
    if summary
        .settle(
            reporter,
            "Failed to update staff clinic assignment due to constraint violation",
            outcome,
        )?
        .is_some()
    {
        reporter.message("Staff clinic assignment updated to invalid clinic (This should not happen).")?;
    }

    reporter.section("Transaction 4: Retrieve Pets by Clinic")?;
    let outcome = transactions::pets_by_clinic(store, LISTED_CLINIC);
    if let Some(pets) = summary.settle(reporter, "Failed to list pets", outcome)? {
        reporter.table(
            &format!("Pets registered at clinic {}", LISTED_CLINIC),
            &ResultSet::from_rows(&pets),
        )?;
    }

    reporter.section("Transaction 5: Generate Examination Report by Staff")?;
    let outcome = transactions::examination_report(store, REPORTED_STAFF);
    if let Some(rows) = summary.settle(reporter, "Failed to build examination report", outcome)? {
        reporter.table(
            &format!("Examinations conducted by staff member {}", REPORTED_STAFF),
            &ResultSet::from_rows(&rows),
        )?;
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        pets = store.count::<Pet>().unwrap_or_default(),
        "walkthrough finished"
    );
    Ok(summary)
}

/// Fatal errors from [`run`] carry this prefix in the binary's output.
pub fn fatal_context(error: &ClinicError) -> &'static str {
    match error {
        ClinicError::SchemaError { .. } => "cannot apply clinic schema",
        ClinicError::Output(_) => "cannot write report",
        _ => "clinic store unavailable",
    }
}
