// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically on database open.

use murmur_core::MurmurError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history`
/// table, so re-running is a no-op.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), MurmurError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| MurmurError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
