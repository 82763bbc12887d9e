//! Migrations for the event log database (logs.duckdb)
//!
//! Kept separate from the main migrations so the event log can be created,
//! cleared or deleted without touching user data.

/// Format: (filename, sql_content), applied in order
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
