/// Database layer for Taskboard
///
/// - `pool`: PostgreSQL connection pool with health check
/// - `migrations`: embedded migration runner
///
/// Models are in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
