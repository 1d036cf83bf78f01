use rusqlite::Connection;
use tracing::info;

use crate::database::DatabaseError;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Running SQLite migrations");

    create_health_readings_table(conn)?;
    create_health_readings_index(conn)?;
    create_health_thresholds_table(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the health readings table
fn create_health_readings_table(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating health_readings table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS health_readings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL,
            parameter_type TEXT NOT NULL CHECK (parameter_type IN
                ('blood_pressure', 'heart_rate', 'blood_sugar', 'temperature', 'weight')),
            value TEXT NOT NULL,
            unit TEXT,
            recorded_at TEXT NOT NULL,
            notes TEXT,
            recorded_by INTEGER,
            created_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| DatabaseError::Migration(format!("Failed to create health_readings: {}", e)))?;

    Ok(())
}

/// Create index used by the window and latest-per-type queries
fn create_health_readings_index(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating index on patient, type and recorded_at");

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_health_readings_patient_type_time
        ON health_readings (patient_id, parameter_type, recorded_at)",
        [],
    )
    .map_err(|e| DatabaseError::Migration(format!("Failed to create index: {}", e)))?;

    Ok(())
}

/// Create the per-patient thresholds table
fn create_health_thresholds_table(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating health_thresholds table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS health_thresholds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL,
            parameter_type TEXT NOT NULL,
            min_value REAL NOT NULL,
            max_value REAL NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK (min_value < max_value),
            UNIQUE (patient_id, parameter_type)
        )",
        [],
    )
    .map_err(|e| DatabaseError::Migration(format!("Failed to create health_thresholds: {}", e)))?;

    Ok(())
}
