//! Workforce schema for the host datastore.
//!
//! Table names listed here are the only identifiers ever interpolated into
//! SQL; everything else is bound as a parameter. Foreign keys are enforced
//! so a transaction touching a missing employee aborts and rolls back.

/// Tables the `db:query` channel may address.
pub const TABLES: &[&str] = &[
    "work_locations",
    "employees",
    "contracts",
    "certifications",
    "medical_visits",
    "documents",
    "alerts",
];

/// Whether `table` is part of the workforce schema.
pub fn is_known_table(table: &str) -> bool {
    TABLES.contains(&table)
}

/// Idempotent DDL applied at startup, in dependency order.
pub const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS work_locations (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        address     TEXT,
        city        TEXT
    )",
    "CREATE TABLE IF NOT EXISTS employees (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name       TEXT NOT NULL,
        last_name        TEXT NOT NULL,
        email            TEXT UNIQUE,
        hired_on         TEXT,
        work_location_id INTEGER REFERENCES work_locations(id)
    )",
    "CREATE TABLE IF NOT EXISTS contracts (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_id   INTEGER NOT NULL REFERENCES employees(id),
        contract_type TEXT NOT NULL,
        starts_on     TEXT,
        ends_on       TEXT
    )",
    "CREATE TABLE IF NOT EXISTS certifications (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_id INTEGER NOT NULL REFERENCES employees(id),
        name        TEXT NOT NULL,
        issued_on   TEXT,
        expires_on  TEXT
    )",
    "CREATE TABLE IF NOT EXISTS medical_visits (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_id  INTEGER NOT NULL REFERENCES employees(id),
        visit_type   TEXT,
        scheduled_on TEXT,
        outcome      TEXT
    )",
    "CREATE TABLE IF NOT EXISTS documents (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_id INTEGER REFERENCES employees(id),
        title       TEXT NOT NULL,
        path        TEXT
    )",
    "CREATE TABLE IF NOT EXISTS alerts (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_id  INTEGER REFERENCES employees(id),
        severity     TEXT NOT NULL,
        message      TEXT NOT NULL,
        acknowledged INTEGER NOT NULL DEFAULT 0
    )",
];
