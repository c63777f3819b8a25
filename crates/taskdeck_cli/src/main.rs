//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskdeck_core` linkage.
//! - Bootstrap an in-memory database and report the schema version.
//! - Keep output deterministic for quick local sanity checks.

use taskdeck_core::db::migrations::latest_version;
use taskdeck_core::db::open_db_in_memory;

fn main() {
    println!("taskdeck_core version={}", taskdeck_core::core_version());

    match open_db_in_memory() {
        Ok(_conn) => {
            println!("schema_version={}", latest_version());
        }
        Err(err) => {
            eprintln!("database bootstrap failed: {err}");
            std::process::exit(1);
        }
    }
}
