//! Baseline rows loaded into a fresh store.

use crate::error::{ClinicError, ClinicResult};
use crate::model::{Clinic, Examination, Owner, Pet, Record, Staff};
use crate::store::ClinicStore;
use crate::validate::Validate;
use tracing::{info, warn};

/// A seed row that the store refused.
#[derive(Debug)]
pub struct SeedFailure {
    pub table: &'static str,
    pub key: String,
    pub error: ClinicError,
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
    pub failures: Vec<SeedFailure>,
}

impl SeedReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The fixed seed set, grouped in dependency order.
#[derive(Debug, Clone)]
pub struct SeedData {
    pub clinics: Vec<Clinic>,
    pub owners: Vec<Owner>,
    pub staff: Vec<Staff>,
    pub pets: Vec<Pet>,
    pub examinations: Vec<Examination>,
}

#[allow(clippy::too_many_arguments)]
fn staff(
    no: &str,
    name: &str,
    address: &str,
    phone: &str,
    dob: &str,
    position: &str,
    salary: f64,
    clinic: &str,
) -> Staff {
    Staff {
        staff_no: no.into(),
        staff_name: name.into(),
        staff_address: address.into(),
        staff_phone: phone.into(),
        date_of_birth: Some(dob.into()),
        position: Some(position.into()),
        salary: Some(salary),
        clinic_no: clinic.into(),
    }
}

#[allow(clippy::too_many_arguments)]
fn pet(
    no: &str,
    name: &str,
    dob: &str,
    species: &str,
    breed: &str,
    color: &str,
    owner: &str,
    clinic: &str,
) -> Pet {
    Pet {
        pet_no: no.into(),
        pet_name: name.into(),
        pet_date_of_birth: dob.into(),
        species: species.into(),
        breed: Some(breed.into()),
        color: Some(color.into()),
        owner_no: owner.into(),
        clinic_no: clinic.into(),
    }
}

fn exam(
    no: &str,
    complaint: &str,
    description: &str,
    seen: &str,
    actions: &str,
    pet: &str,
    staff: &str,
) -> Examination {
    Examination {
        exam_no: no.into(),
        chief_complaint: complaint.into(),
        description: Some(description.into()),
        date_seen: seen.into(),
        actions_taken: Some(actions.into()),
        pet_no: pet.into(),
        staff_no: staff.into(),
    }
}

impl SeedData {
    pub fn baseline() -> Self {
        Self {
            clinics: vec![
                Clinic::new("C000001", "Downtown Veterinary Clinic", "123 Main St, New York, NY 10001", "212-555-0101"),
                Clinic::new("C000002", "Uptown Animal Hospital", "456 Elm St, Los Angeles, CA 90001", "213-555-0202"),
                Clinic::new("C000003", "Eastside Pet Care", "789 Oak St, Chicago, IL 60601", "312-555-0303"),
                Clinic::new("C000004", "Westside Animal Clinic", "321 Pine St, Houston, TX 77001", "713-555-0404"),
                Clinic::new("C000005", "North End Vet", "654 Maple St, Phoenix, AZ 85001", "602-555-0505"),
            ],
            owners: vec![
                Owner::new("O000001", "John Doe", "100 First St, Boston, MA 02108", "617-555-0606"),
                Owner::new("O000002", "Jane Smith", "200 Second St, Seattle, WA 98101", "206-555-0707"),
                Owner::new("O000003", "Bob Johnson", "300 Third St, Miami, FL 33101", "305-555-0808"),
                Owner::new("O000004", "Alice Williams", "400 Fourth St, Denver, CO 80201", "303-555-0909"),
                Owner::new("O000005", "Mike Brown", "500 Fifth St, Atlanta, GA 30301", "404-555-1010"),
            ],
            staff: vec![
                staff("S000001", "Dr. Emily Davis", "101 First St, New York, NY 10001", "212-555-1111", "1975-05-15", "Veterinarian", 85000.0, "C000001"),
                staff("S000002", "Dr. Daniel Lee", "202 Second St, Los Angeles, CA 90001", "213-555-2222", "1980-07-20", "Veterinarian", 80000.0, "C000002"),
                staff("S000003", "Laura Kim", "303 Third St, Chicago, IL 60601", "312-555-3333", "1985-09-25", "Nurse", 50000.0, "C000003"),
                staff("S000004", "Anna Brown", "404 Fourth St, Houston, TX 77001", "713-555-4444", "1990-11-30", "Receptionist", 35000.0, "C000004"),
                staff("S000005", "Mark Wilson", "505 Fifth St, Phoenix, AZ 85001", "602-555-5555", "1988-02-05", "Technician", 45000.0, "C000005"),
            ],
            pets: vec![
                pet("P000001", "Buddy", "2015-06-01", "Dog", "Golden Retriever", "Golden", "O000001", "C000001"),
                pet("P000002", "Whiskers", "2017-08-15", "Cat", "Siamese", "Cream", "O000002", "C000002"),
                pet("P000003", "Charlie", "2019-12-20", "Rabbit", "Dutch", "Black and White", "O000003", "C000003"),
                pet("P000004", "Max", "2018-03-10", "Dog", "Labrador", "Black", "O000004", "C000004"),
                pet("P000005", "Coco", "2020-05-05", "Bird", "Parakeet", "Green", "O000005", "C000005"),
            ],
            examinations: vec![
                exam("E000001", "Annual Checkup", "Routine physical examination", "2023-01-15", "Vaccinated, dewormed", "P000001", "S000001"),
                exam("E000002", "Coughing", "Examined respiratory system", "2023-02-20", "Prescribed antibiotics", "P000002", "S000002"),
                exam("E000003", "Limping", "Examined left hind leg", "2023-03-25", "Applied bandage", "P000003", "S000003"),
                exam("E000004", "Loss of appetite", "Conducted blood tests", "2023-04-30", "Recommended special diet", "P000004", "S000004"),
                exam("E000005", "Feather plucking", "Behavioral assessment", "2023-05-05", "Provided environmental enrichment suggestions", "P000005", "S000005"),
            ],
        }
    }
}

/// Insert every seed row whose key is not already present. A refused row is
/// recorded and seeding moves on to the next one; only a fatal store error
/// stops it.
pub fn seed(store: &ClinicStore, data: &SeedData) -> ClinicResult<SeedReport> {
    let mut report = SeedReport::default();
    seed_rows(store, &data.clinics, &mut report)?;
    seed_rows(store, &data.owners, &mut report)?;
    seed_rows(store, &data.staff, &mut report)?;
    seed_rows(store, &data.pets, &mut report)?;
    seed_rows(store, &data.examinations, &mut report)?;
    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failures.len(),
        "seeding finished"
    );
    Ok(report)
}

fn seed_rows<R: Record + Validate>(
    store: &ClinicStore,
    rows: &[R],
    report: &mut SeedReport,
) -> ClinicResult<()> {
    for row in rows {
        if store.exists::<R>(row.key())? {
            report.skipped += 1;
            continue;
        }
        match store.insert(row) {
            Ok(()) => report.inserted += 1,
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                warn!(table = R::TABLE, key = row.key(), %error, "seed row rejected");
                report.failures.push(SeedFailure {
                    table: R::TABLE,
                    key: row.key().to_string(),
                    error,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstraintCategory;

    #[test]
    fn baseline_seeds_cleanly_once() {
        let store = ClinicStore::open_in_memory().unwrap();
        let first = seed(&store, &SeedData::baseline()).unwrap();
        assert!(first.is_clean());
        assert_eq!(first.inserted, 25);

        let second = seed(&store, &SeedData::baseline()).unwrap();
        assert!(second.is_clean());
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 25);
        assert_eq!(store.count::<Pet>().unwrap(), 5);
    }

    #[test]
    fn bad_row_fails_alone_and_dependents_fail_their_reference() {
        let store = ClinicStore::open_in_memory().unwrap();
        let mut data = SeedData::baseline();
        data.owners[0].owner_phone = "617-5550606".into();

        let report = seed(&store, &data).unwrap();
        assert_eq!(report.failures.len(), 3);
        assert_eq!(report.failures[0].key, "O000001");
        assert_eq!(
            report.failures[0].error.category(),
            Some(ConstraintCategory::Format)
        );
        // P000001 belongs to the rejected owner.
        assert_eq!(report.failures[1].key, "P000001");
        assert_eq!(
            report.failures[1].error.category(),
            Some(ConstraintCategory::ForeignKey)
        );
        assert_eq!(report.failures[2].key, "E000001");
        assert_eq!(store.count::<Owner>().unwrap(), 4);
        assert_eq!(store.count::<Examination>().unwrap(), 4);
    }
}
