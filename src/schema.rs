//! Declarative clinic schema and the DDL it renders to.

use crate::error::{ClinicError, ClinicResult, ConstraintCategory};
use crate::model::{Clinic, Examination, Owner, Pet, Position, Record, Species, Staff};
use rusqlite::Connection;
use tracing::{debug, info};

/// Schema definition for the clinic store
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds a required reference column and its foreign key.
    pub fn references(mut self, column: &str, foreign_table: &str) -> Self {
        self.columns
            .push(ColumnDefinition::text(column).not_null());
        self.foreign_keys.push(ForeignKey {
            column: column.to_string(),
            foreign_table: foreign_table.to_string(),
            foreign_column: column.to_string(),
            on_delete: ForeignKeyAction::Restrict,
            on_update: ForeignKeyAction::NoAction,
        });
        self
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn to_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.to_sql(&self.name))
            .collect();
        parts.extend(self.foreign_keys.iter().map(ForeignKey::to_sql));
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.name,
            parts.join(",\n    ")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDefinition {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: DataType::Text,
            constraints: Vec::new(),
        }
    }

    pub fn real(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: DataType::Real,
            constraints: Vec::new(),
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.constraints.push(ColumnConstraint::PrimaryKey);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.constraints.push(ColumnConstraint::NotNull);
        self
    }

    pub fn unique(mut self) -> Self {
        self.constraints.push(ColumnConstraint::Unique);
        self
    }

    /// Adds a named check; `expr` uses `{col}` for the column name.
    pub fn check(mut self, category: ConstraintCategory, expr: &str) -> Self {
        self.constraints.push(ColumnConstraint::Check {
            category,
            expression: expr.replace("{col}", &self.name),
        });
        self
    }

    fn to_sql(&self, table: &str) -> String {
        let mut sql = format!("{} {}", self.name, self.data_type.as_sql());
        for constraint in &self.constraints {
            sql.push(' ');
            match constraint {
                ColumnConstraint::PrimaryKey => sql.push_str("PRIMARY KEY"),
                ColumnConstraint::NotNull => sql.push_str("NOT NULL"),
                ColumnConstraint::Unique => sql.push_str("UNIQUE"),
                ColumnConstraint::Check {
                    category,
                    expression,
                } => sql.push_str(&check_sql(table, &self.name, *category, expression)),
            }
        }
        sql
    }

    /// Rendered check clauses, as they appear in the stored table SQL.
    fn checks<'a>(&'a self, table: &'a str) -> impl Iterator<Item = String> + 'a {
        self.constraints.iter().filter_map(move |c| match c {
            ColumnConstraint::Check {
                category,
                expression,
            } => Some(check_sql(table, &self.name, *category, expression)),
            _ => None,
        })
    }
}

fn check_sql(table: &str, column: &str, category: ConstraintCategory, expression: &str) -> String {
    format!(
        "CONSTRAINT {} CHECK ({})",
        constraint_name(table, column, category),
        expression
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataType {
    Text,
    Real,
}

impl DataType {
    fn as_sql(&self) -> &'static str {
        match self {
            DataType::Text => "TEXT",
            DataType::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnConstraint {
    PrimaryKey,
    NotNull,
    Unique,
    Check {
        category: ConstraintCategory,
        expression: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub column: String,
    pub foreign_table: String,
    pub foreign_column: String,
    pub on_delete: ForeignKeyAction,
    pub on_update: ForeignKeyAction,
}

impl ForeignKey {
    fn to_sql(&self) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
            self.column,
            self.foreign_table,
            self.foreign_column,
            self.on_delete.as_sql(),
            self.on_update.as_sql()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForeignKeyAction {
    NoAction,
    Restrict,
}

impl ForeignKeyAction {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Restrict => "RESTRICT",
        }
    }
}

/// Name given to a check constraint, e.g. `pet_petName_format`.
pub fn constraint_name(table: &str, column: &str, category: ConstraintCategory) -> String {
    format!(
        "{}_{}_{}",
        table.to_lowercase(),
        column,
        category.check_suffix()
    )
}

// GLOB and LENGTH stop at an embedded NUL; instr() sees the whole value.
const NO_NUL: &str = "instr({col}, char(0)) = 0";
const NO_DIGITS: &str = "{col} NOT GLOB '*[0-9]*' AND instr({col}, char(0)) = 0";
const PHONE: &str = "{col} GLOB '[0-9][0-9][0-9]-[0-9][0-9][0-9]-[0-9][0-9][0-9][0-9]' \
                     AND LENGTH({col}) = 12 AND instr({col}, char(0)) = 0";
// date() normalises out-of-range days, so the round trip must be exact.
const CALENDAR_DATE: &str = "date({col}) IS {col}";
const MAX_TEXT_500: &str = "LENGTH({col}) <= 500 AND instr({col}, char(0)) = 0";

fn identifier(name: &str, prefix: char) -> ColumnDefinition {
    ColumnDefinition::text(name)
        .primary_key()
        .not_null()
        .check(
            ConstraintCategory::Format,
            &format!(
                "{{col}} GLOB '{}[0-9][0-9][0-9][0-9][0-9][0-9]' AND {}",
                prefix, NO_NUL
            ),
        )
}

fn person_name(name: &str) -> ColumnDefinition {
    ColumnDefinition::text(name)
        .not_null()
        .check(ConstraintCategory::Format, NO_DIGITS)
}

fn phone(name: &str) -> ColumnDefinition {
    ColumnDefinition::text(name)
        .not_null()
        .unique()
        .check(ConstraintCategory::Format, PHONE)
}

fn one_of(name: &str, allowed: &[&str]) -> ColumnDefinition {
    let list = allowed
        .iter()
        .map(|v| format!("'{}'", v))
        .collect::<Vec<_>>()
        .join(", ");
    ColumnDefinition::text(name).check(ConstraintCategory::Enum, &format!("{{col}} IN ({})", list))
}

/// The five clinic tables in dependency order.
pub fn clinic_schema() -> Schema {
    let species: Vec<&str> = Species::ALL.iter().map(Species::as_str).collect();
    let positions: Vec<&str> = Position::ALL.iter().map(Position::as_str).collect();

    Schema::new()
        .add_table(
            TableDefinition::new(Clinic::TABLE)
                .column(identifier("clinicNo", 'C'))
                .column(person_name("clinicName"))
                .column(ColumnDefinition::text("clinicAddress").not_null())
                .column(phone("clinicPhone")),
        )
        .add_table(
            TableDefinition::new(Owner::TABLE)
                .column(identifier("ownerNo", 'O'))
                .column(person_name("ownerName"))
                .column(ColumnDefinition::text("ownerAddress").not_null())
                .column(phone("ownerPhone")),
        )
        .add_table(
            TableDefinition::new(Staff::TABLE)
                .column(identifier("staffNo", 'S'))
                .column(person_name("staffName"))
                .column(ColumnDefinition::text("staffAddress").not_null())
                .column(phone("staffPhone"))
                .column(
                    ColumnDefinition::text("dateOfBirth")
                        .check(ConstraintCategory::Format, CALENDAR_DATE),
                )
                .column(one_of("position", &positions))
                .column(ColumnDefinition::real("salary").check(ConstraintCategory::Range, "{col} > 0"))
                .references("clinicNo", Clinic::TABLE),
        )
        .add_table(
            TableDefinition::new(Pet::TABLE)
                .column(identifier("petNo", 'P'))
                .column(person_name("petName"))
                .column(
                    ColumnDefinition::text("petDateOfBirth")
                        .not_null()
                        .check(ConstraintCategory::Format, CALENDAR_DATE),
                )
                .column(one_of("species", &species).not_null())
                .column(ColumnDefinition::text("breed"))
                .column(ColumnDefinition::text("color"))
                .references("ownerNo", Owner::TABLE)
                .references("clinicNo", Clinic::TABLE),
        )
        .add_table(
            TableDefinition::new(Examination::TABLE)
                .column(identifier("examNo", 'E'))
                .column(
                    ColumnDefinition::text("chiefComplaint")
                        .not_null()
                        .check(ConstraintCategory::Length, MAX_TEXT_500),
                )
                .column(
                    ColumnDefinition::text("description")
                        .check(ConstraintCategory::Length, MAX_TEXT_500),
                )
                .column(
                    ColumnDefinition::text("dateSeen")
                        .not_null()
                        .check(ConstraintCategory::Format, CALENDAR_DATE),
                )
                .column(ColumnDefinition::text("actionsTaken"))
                .references("petNo", Pet::TABLE)
                .references("staffNo", Staff::TABLE),
        )
}

/// Create any missing clinic tables and check existing ones against the
/// declared layout. Safe to call on an initialized store.
pub fn ensure_schema(conn: &Connection, schema: &Schema) -> ClinicResult<()> {
    let ddl = schema
        .tables
        .iter()
        .map(TableDefinition::to_sql)
        .collect::<Vec<_>>()
        .join("\n");
    debug!("applying schema:\n{}", ddl);

    conn.execute_batch(&format!("BEGIN;\n{}\nCOMMIT;", ddl))
        .map_err(|e| {
            // A failed batch can leave the explicit transaction open.
            let _ = conn.execute_batch("ROLLBACK;");
            ClinicError::SchemaError {
                reason: format!("failed to create tables: {}", e),
            }
        })?;

    verify_schema(conn, schema)?;
    info!(tables = schema.tables.len(), "schema ready");
    Ok(())
}

/// Compare each declared table's columns and named checks with what the
/// store holds. Tables created without the named checks are refused, since
/// their rejections could not be classified.
pub fn verify_schema(conn: &Connection, schema: &Schema) -> ClinicResult<()> {
    let inspect_failed = |e: rusqlite::Error| ClinicError::SchemaError {
        reason: format!("cannot inspect tables: {}", e),
    };
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(inspect_failed)?;
    let mut table_sql = conn
        .prepare("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1")
        .map_err(inspect_failed)?;

    for table in &schema.tables {
        let actual = stmt
            .query_map([&table.name], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| ClinicError::SchemaError {
                reason: format!("cannot inspect table {}: {}", table.name, e),
            })?;

        if actual != table.column_names() {
            return Err(ClinicError::SchemaError {
                reason: format!(
                    "table {} has columns [{}], expected [{}]",
                    table.name,
                    actual.join(", "),
                    table.column_names().join(", ")
                ),
            });
        }

        let sql: String = table_sql
            .query_row([&table.name], |row| row.get(0))
            .map_err(inspect_failed)?;
        for column in &table.columns {
            if let Some(missing) = column.checks(&table.name).find(|check| !sql.contains(check.as_str())) {
                return Err(ClinicError::SchemaError {
                    reason: format!("table {} lacks check `{}`", table.name, missing),
                });
            }
        }
    }
    Ok(())
}

/// Drop the clinic tables, children first.
pub fn drop_schema(conn: &Connection, schema: &Schema) -> ClinicResult<()> {
    for table in schema.tables.iter().rev() {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", table.name))
            .map_err(|e| ClinicError::SchemaError {
                reason: format!("failed to drop {}: {}", table.name, e),
            })?;
        debug!(table = %table.name, "dropped table");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_count(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn renders_named_checks_and_restrict() {
        let schema = clinic_schema();
        let pet = schema.table("Pet").unwrap().to_sql();
        assert!(pet.starts_with("CREATE TABLE IF NOT EXISTS Pet ("));
        assert!(pet.contains(
            "CONSTRAINT pet_petName_format CHECK (petName NOT GLOB '*[0-9]*' AND instr(petName, char(0)) = 0)"
        ));
        assert!(pet.contains(
            "CONSTRAINT pet_species_enum CHECK (species IN ('Dog', 'Cat', 'Bird', 'Rabbit', 'Other'))"
        ));
        assert!(pet.contains("FOREIGN KEY (ownerNo) REFERENCES Owner (ownerNo) ON DELETE RESTRICT"));
    }

    #[test]
    fn columns_match_record_types() {
        let schema = clinic_schema();
        assert_eq!(schema.table("Clinic").unwrap().column_names(), Clinic::COLUMNS);
        assert_eq!(schema.table("Owner").unwrap().column_names(), Owner::COLUMNS);
        assert_eq!(schema.table("Staff").unwrap().column_names(), Staff::COLUMNS);
        assert_eq!(schema.table("Pet").unwrap().column_names(), Pet::COLUMNS);
        assert_eq!(
            schema.table("Examination").unwrap().column_names(),
            Examination::COLUMNS
        );
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = clinic_schema();
        ensure_schema(&conn, &schema).unwrap();
        ensure_schema(&conn, &schema).unwrap();
        assert_eq!(table_count(&conn), 5);
    }

    #[test]
    fn mismatched_existing_table_is_a_schema_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE Clinic (clinicNo TEXT PRIMARY KEY, label TEXT);")
            .unwrap();
        let err = ensure_schema(&conn, &clinic_schema()).unwrap_err();
        assert!(matches!(err, ClinicError::SchemaError { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn table_with_unnamed_checks_is_a_schema_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Clinic (
                clinicNo TEXT PRIMARY KEY NOT NULL CHECK (clinicNo GLOB 'C[0-9][0-9][0-9][0-9][0-9][0-9]'),
                clinicName TEXT NOT NULL CHECK (clinicName NOT GLOB '*[0-9]*'),
                clinicAddress TEXT NOT NULL,
                clinicPhone TEXT NOT NULL UNIQUE
            );",
        )
        .unwrap();
        let err = ensure_schema(&conn, &clinic_schema()).unwrap_err();
        match err {
            ClinicError::SchemaError { reason } => assert!(reason.contains("clinic_clinicNo_format"), "{}", reason),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn drop_schema_removes_every_table() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = clinic_schema();
        ensure_schema(&conn, &schema).unwrap();
        drop_schema(&conn, &schema).unwrap();
        assert_eq!(table_count(&conn), 0);
    }
}
