//! The clinic store handle.
//!
//! `ClinicStore` owns the single SQLite connection for a run. It is passed
//! explicitly to the seeder and the transactions; dropping it closes the
//! connection.

use crate::error::{ClinicError, ClinicResult, ConstraintCategory};
use crate::model::{Record, Value};
use crate::schema::{self, Schema};
use crate::validate::Validate;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

pub const DEFAULT_DB_PATH: &str = "vet_clinic.db";
const IN_MEMORY: &str = ":memory:";

/// Store configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite database file (":memory:" for in-memory)
    pub db_path: String,
    /// Run the application-side validator before every write
    pub validate_writes: bool,
}

impl StoreConfig {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            validate_writes: true,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    /// Leave all checking to the store's own constraints.
    pub fn store_checks_only(mut self) -> Self {
        self.validate_writes = false;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH)
    }
}

pub struct ClinicStore {
    conn: Connection,
    config: StoreConfig,
    schema: Schema,
}

impl ClinicStore {
    /// Open (or create) the store and enable foreign key enforcement. The
    /// schema is not touched; see [`ClinicStore::ensure_schema`].
    pub fn open(config: StoreConfig) -> ClinicResult<Self> {
        info!(path = %config.db_path, "opening clinic store");
        let opened = if config.db_path == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.db_path)
        };
        let conn = opened
            .map_err(|e| ClinicError::unavailable(format!("cannot open {}", config.db_path), e))?;

        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| ClinicError::unavailable("cannot enable foreign keys", e))?;

        Ok(Self {
            conn,
            config,
            schema: schema::clinic_schema(),
        })
    }

    /// Open a disposable in-memory store with the schema applied.
    pub fn open_in_memory() -> ClinicResult<Self> {
        let store = Self::open(StoreConfig::in_memory())?;
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn ensure_schema(&self) -> ClinicResult<()> {
        schema::ensure_schema(&self.conn, &self.schema)
    }

    pub fn drop_schema(&self) -> ClinicResult<()> {
        schema::drop_schema(&self.conn, &self.schema)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Insert one record outside of any explicit transaction.
    pub fn insert<R: Record + Validate>(&self, record: &R) -> ClinicResult<()> {
        insert(&self.conn, record, self.config.validate_writes)
    }

    pub fn find<R: Record>(&self, key: &str) -> ClinicResult<Option<R>> {
        find(&self.conn, key)
    }

    pub fn exists<R: Record>(&self, key: &str) -> ClinicResult<bool> {
        exists::<R>(&self.conn, key)
    }

    pub fn count<R: Record>(&self) -> ClinicResult<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", R::TABLE), [], |row| {
                row.get(0)
            })
            .map_err(|e| ClinicError::from_store(R::TABLE, e))
    }

    /// Release the connection, reporting any error from closing it.
    pub fn close(self) -> ClinicResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| ClinicError::unavailable("failed to close store", e))
    }
}

/// Parameterized insert of `record`; column names come from the record type,
/// values are always bound.
pub(crate) fn insert<R: Record + Validate>(
    conn: &Connection,
    record: &R,
    validate: bool,
) -> ClinicResult<()> {
    if validate {
        record.validate()?;
    }
    let values = record.values();
    // SQLite stores NaN as NULL and lets infinities through `> 0` checks.
    if let Some((column, value)) = R::COLUMNS
        .iter()
        .zip(&values)
        .find(|(_, v)| matches!(v, Value::Real(r) if !r.is_finite()))
    {
        return Err(ClinicError::violation(
            R::TABLE,
            schema::constraint_name(R::TABLE, column, ConstraintCategory::Range),
            ConstraintCategory::Range,
            format!("{} {} is not a finite number", column, value),
        ));
    }
    let placeholders = (1..=R::COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::TABLE,
        R::COLUMNS.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(values))
        .map_err(|e| ClinicError::from_store(R::TABLE, e))?;
    debug!(table = R::TABLE, key = record.key(), "inserted row");
    Ok(())
}

pub(crate) fn find<R: Record>(conn: &Connection, key: &str) -> ClinicResult<Option<R>> {
    let sql = format!("SELECT * FROM {} WHERE {} = ?1", R::TABLE, R::COLUMNS[0]);
    conn.query_row(&sql, [key], R::from_row)
        .optional()
        .map_err(|e| ClinicError::from_store(R::TABLE, e))
}

pub(crate) fn exists<R: Record>(conn: &Connection, key: &str) -> ClinicResult<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1)",
        R::TABLE,
        R::COLUMNS[0]
    );
    conn.query_row(&sql, [key], |row| row.get(0))
        .map_err(|e| ClinicError::from_store(R::TABLE, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Clinic, Staff};

    #[test]
    fn insert_and_find_round_trip() {
        let store = ClinicStore::open_in_memory().unwrap();
        let clinic = Clinic::new("C000009", "Harbor Vet", "9 Dock Rd", "555-555-0199");
        store.insert(&clinic).unwrap();
        assert_eq!(store.find::<Clinic>("C000009").unwrap(), Some(clinic));
        assert!(store.exists::<Clinic>("C000009").unwrap());
        assert_eq!(store.find::<Clinic>("C000010").unwrap(), None);
    }

    #[test]
    fn duplicate_phone_leaves_store_unchanged() {
        let store = ClinicStore::open_in_memory().unwrap();
        store
            .insert(&Clinic::new("C000001", "Harbor Vet", "9 Dock Rd", "555-555-0199"))
            .unwrap();
        let err = store
            .insert(&Clinic::new("C000002", "Bay Vet", "10 Dock Rd", "555-555-0199"))
            .unwrap_err();
        assert_eq!(err.category(), Some(ConstraintCategory::Unique));
        assert_eq!(err.constraint(), Some("Clinic.clinicPhone"));
        assert_eq!(store.count::<Clinic>().unwrap(), 1);
    }

    #[test]
    fn non_finite_salary_is_refused_without_validator() {
        let store = ClinicStore::open(StoreConfig::in_memory().store_checks_only()).unwrap();
        store.ensure_schema().unwrap();
        store
            .insert(&Clinic::new("C000001", "Harbor Vet", "9 Dock Rd", "555-555-0199"))
            .unwrap();
        for salary in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let staff = Staff {
                staff_no: "S000009".into(),
                staff_name: "Laura Kim".into(),
                staff_address: "303 Third St".into(),
                staff_phone: "312-555-9999".into(),
                date_of_birth: None,
                position: None,
                salary: Some(salary),
                clinic_no: "C000001".into(),
            };
            let err = store.insert(&staff).unwrap_err();
            assert_eq!(err.constraint(), Some("staff_salary_range"));
            assert_eq!(err.category(), Some(ConstraintCategory::Range));
        }
        assert_eq!(store.count::<Staff>().unwrap(), 0);
    }

    #[test]
    fn foreign_keys_are_enabled() {
        let store = ClinicStore::open_in_memory().unwrap();
        let enabled: bool = store
            .connection()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }

    #[test]
    fn unopenable_path_is_store_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("clinic.db");
        let err = ClinicStore::open(StoreConfig::new(path.to_string_lossy()))
            .err()
            .unwrap();
        assert!(matches!(err, ClinicError::StoreUnavailable { .. }));
        assert!(err.is_fatal());
    }
}
