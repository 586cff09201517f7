//! The application-side validator and the store's own constraints must
//! refuse exactly the same writes, naming the same constraint.

use proptest::prelude::*;
use vet_clinic::model::{Clinic, Examination, Pet, Record, Staff};
use vet_clinic::seed::{seed, SeedData};
use vet_clinic::validate::Validate;
use vet_clinic::{ClinicResult, ClinicStore, StoreConfig};

fn store_only(seeded: bool) -> ClinicStore {
    let store = ClinicStore::open(StoreConfig::in_memory().store_checks_only()).unwrap();
    store.ensure_schema().unwrap();
    if seeded {
        seed(&store, &SeedData::baseline()).unwrap();
    }
    store
}

/// (validator outcome, store outcome) for a single insert.
fn both_paths<R: Record + Validate>(store: &ClinicStore, record: &R) -> (ClinicResult<()>, ClinicResult<()>) {
    (record.validate(), store.insert(record))
}

fn check_agreement<R: Record + Validate>(store: &ClinicStore, record: &R) -> Result<(), TestCaseError> {
    let (app, db) = both_paths(store, record);
    prop_assert_eq!(app.is_ok(), db.is_ok(), "validator {:?} vs store {:?}", app, db);
    if let (Err(app), Err(db)) = (&app, &db) {
        prop_assert_eq!(app.category(), db.category());
        prop_assert_eq!(app.constraint(), db.constraint());
    }
    Ok(())
}

fn clinic(no: &str, name: &str, phone: &str) -> Clinic {
    Clinic::new(no, name, "1 Test Rd, Springfield", phone)
}

fn pet_with(f: impl FnOnce(&mut Pet)) -> Pet {
    let mut pet = Pet {
        pet_no: "P000100".into(),
        pet_name: "Pepper".into(),
        pet_date_of_birth: "2020-01-01".into(),
        species: "Cat".into(),
        breed: None,
        color: None,
        owner_no: "O000001".into(),
        clinic_no: "C000001".into(),
    };
    f(&mut pet);
    pet
}

fn staff_with(f: impl FnOnce(&mut Staff)) -> Staff {
    let mut staff = Staff {
        staff_no: "S000100".into(),
        staff_name: "Sam Rivera".into(),
        staff_address: "7 Test Ave".into(),
        staff_phone: "999-555-0100".into(),
        date_of_birth: Some("1990-01-01".into()),
        position: Some("Technician".into()),
        salary: Some(40000.0),
        clinic_no: "C000001".into(),
    };
    f(&mut staff);
    staff
}

fn exam_with(f: impl FnOnce(&mut Examination)) -> Examination {
    let mut exam = Examination {
        exam_no: "E000100".into(),
        chief_complaint: "Sneezing".into(),
        description: None,
        date_seen: "2023-07-01".into(),
        actions_taken: None,
        pet_no: "P000001".into(),
        staff_no: "S000001".into(),
    };
    f(&mut exam);
    exam
}

#[test]
fn known_bad_rows_are_rejected_by_both_paths() {
    let cases: Vec<(&str, Box<dyn Fn(&ClinicStore) -> (ClinicResult<()>, ClinicResult<()>)>)> = vec![
        ("digit in pet name", Box::new(|s: &ClinicStore| both_paths(s, &pet_with(|p| p.pet_name = "123InvalidName".into())))),
        ("impossible month", Box::new(|s: &ClinicStore| both_paths(s, &pet_with(|p| p.pet_date_of_birth = "2021-15-15".into())))),
        ("day past month end", Box::new(|s: &ClinicStore| both_paths(s, &pet_with(|p| p.pet_date_of_birth = "2021-02-30".into())))),
        ("unknown species", Box::new(|s: &ClinicStore| both_paths(s, &pet_with(|p| p.species = "Dinosaur".into())))),
        ("short pet id", Box::new(|s: &ClinicStore| both_paths(s, &pet_with(|p| p.pet_no = "P00010".into())))),
        ("malformed clinic reference", Box::new(|s: &ClinicStore| both_paths(s, &pet_with(|p| p.clinic_no = "InvalidClinicNo".into())))),
        ("zero salary", Box::new(|s: &ClinicStore| both_paths(s, &staff_with(|st| st.salary = Some(0.0))))),
        ("unknown position", Box::new(|s: &ClinicStore| both_paths(s, &staff_with(|st| st.position = Some("Janitor".into()))))),
        ("phone without dashes", Box::new(|s: &ClinicStore| both_paths(s, &staff_with(|st| st.staff_phone = "9995550100".into())))),
        ("exam date", Box::new(|s: &ClinicStore| both_paths(s, &exam_with(|e| e.date_seen = "2023-13-40".into())))),
        ("long description", Box::new(|s: &ClinicStore| both_paths(s, &exam_with(|e| e.description = Some("d".repeat(501)))))),
        ("clinic id prefix", Box::new(|s: &ClinicStore| both_paths(s, &clinic("X000009", "Harbor Vet", "555-555-0199")))),
        ("NUL hides a digit", Box::new(|s: &ClinicStore| both_paths(s, &clinic("C000100", "Bob\u{0}5", "555-555-0199")))),
        ("NUL hides phone tail", Box::new(|s: &ClinicStore| both_paths(s, &clinic("C000100", "Harbor Vet", "555-555-0198\u{0}x")))),
        ("NUL after clinic id", Box::new(|s: &ClinicStore| both_paths(s, &clinic("C000100\u{0}", "Harbor Vet", "555-555-0199")))),
        ("NUL after date", Box::new(|s: &ClinicStore| both_paths(s, &pet_with(|p| p.pet_date_of_birth = "2021-01-01\u{0}".into())))),
        ("NUL hides long complaint", Box::new(|s: &ClinicStore| both_paths(s, &exam_with(|e| e.chief_complaint = format!("a\u{0}{}", "x".repeat(600)))))),
        ("NaN salary", Box::new(|s: &ClinicStore| both_paths(s, &staff_with(|st| st.salary = Some(f64::NAN))))),
        ("infinite salary", Box::new(|s: &ClinicStore| both_paths(s, &staff_with(|st| st.salary = Some(f64::INFINITY))))),
    ];

    for (label, attempt) in cases {
        let store = store_only(true);
        let (app, db) = attempt(&store);
        let app = app.expect_err(label);
        let db = db.expect_err(label);
        assert_eq!(app.category(), db.category(), "{}", label);
        assert_eq!(app.constraint(), db.constraint(), "{}", label);
    }
}

#[test]
fn nullable_columns_accept_missing_values_on_both_paths() {
    let store = store_only(true);
    let staff = staff_with(|st| {
        st.date_of_birth = None;
        st.position = None;
        st.salary = None;
    });
    let (app, db) = both_paths(&store, &staff);
    assert!(app.is_ok());
    assert!(db.is_ok());
}

/// `base` with a NUL spliced in after a generated prefix.
fn with_nul(base: &'static str) -> impl Strategy<Value = String> {
    (base, "[ -~]{0,4}").prop_map(|(head, tail)| format!("{}\u{0}{}", head, tail))
}

fn identifier() -> impl Strategy<Value = String> {
    prop_oneof![
        "C[0-9]{6}",
        "[A-Z][0-9]{5,7}",
        "[ -~]{0,9}",
        with_nul("C[0-9]{6}"),
    ]
}

fn name() -> impl Strategy<Value = String> {
    prop_oneof!["[ -~]{0,16}", with_nul("[A-Za-z ]{0,8}")]
}

fn phone() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{3}-[0-9]{3}-[0-9]{4}",
        "[0-9-]{10,13}",
        "[ -~]{0,14}",
        with_nul("[0-9]{3}-[0-9]{3}-[0-9]{4}"),
    ]
}

fn salary() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1000.0f64..1000.0,
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

fn date() -> impl Strategy<Value = String> {
    prop_oneof![
        (1900i32..2100, 0u32..15, 0u32..35).prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d)),
        "[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}",
        "[ -~]{0,12}",
    ]
}

fn species() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec!["Dog", "Cat", "Bird", "Rabbit", "Other"]).prop_map(String::from),
        "[A-Za-z]{0,10}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn clinic_identifier_checks_agree(no in identifier()) {
        check_agreement(&store_only(false), &clinic(&no, "Harbor Vet", "555-555-0199"))?;
    }

    #[test]
    fn name_checks_agree(name in name()) {
        check_agreement(&store_only(false), &clinic("C000100", &name, "555-555-0199"))?;
    }

    #[test]
    fn phone_checks_agree(phone in phone()) {
        check_agreement(&store_only(false), &clinic("C000100", "Harbor Vet", &phone))?;
    }

    #[test]
    fn date_checks_agree(date in date()) {
        check_agreement(&store_only(true), &pet_with(|p| p.pet_date_of_birth = date))?;
    }

    #[test]
    fn species_checks_agree(species in species()) {
        check_agreement(&store_only(true), &pet_with(|p| p.species = species))?;
    }

    #[test]
    fn salary_checks_agree(salary in salary()) {
        check_agreement(&store_only(true), &staff_with(|st| st.salary = Some(salary)))?;
    }

    #[test]
    fn length_checks_agree(len in 490usize..510, wide in any::<bool>(), nul in any::<bool>()) {
        let mut text = if wide { "é".repeat(len) } else { "x".repeat(len) };
        if nul {
            text.insert(0, '\u{0}');
        }
        check_agreement(&store_only(true), &exam_with(|e| e.chief_complaint = text))?;
    }
}
