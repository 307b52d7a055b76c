use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::core::error::AppResult;
use crate::storage::migrations::run_migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and brings the
/// schema up to date.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
///
/// # Example
///
/// ```no_run
/// use techinterview::storage::db;
///
/// let pool = db::create_pool("techinterview.sqlite")?;
/// # Ok::<(), techinterview::core::AppError>(())
/// ```
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")
    });
    let pool = Pool::builder().max_size(10).build(manager)?;

    let mut conn = pool.get()?;
    let applied = run_migrations(&mut conn)?;
    log::info!("Database ready at {} ({} migrations applied)", database_path, applied);

    Ok(pool)
}

/// Single-connection pool over a private in-memory database.
///
/// Every checkout returns the same connection, so the schema and data persist
/// for the pool's lifetime.
pub fn create_in_memory_pool() -> AppResult<DbPool> {
    let pool = Pool::builder()
        .max_size(1)
        .build(SqliteConnectionManager::memory())?;

    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    Ok(pool.get()?)
}
