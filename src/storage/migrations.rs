use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use rusqlite::Connection;

use crate::core::error::AppResult;

mod embedded {
    use refinery::embed_migrations;

    embed_migrations!("./migrations");
}

static MIGRATION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Applies pending migrations and returns how many ran.
///
/// The whole batch runs as one grouped transaction. refinery opens that
/// transaction itself, so no outer `BEGIN` is issued here; the busy timeout
/// makes a second process wait for the first one's write lock.
pub fn run_migrations(conn: &mut Connection) -> AppResult<usize> {
    let mutex = MIGRATION_LOCK.get_or_init(|| Mutex::new(()));
    let _guard = match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Migration lock was poisoned, recovering...");
            poisoned.into_inner()
        }
    };

    conn.busy_timeout(Duration::from_secs(30))?;

    let report = embedded::migrations::runner().set_grouped(true).run(conn)?;
    for migration in report.applied_migrations() {
        log::info!("Applied migration {}", migration);
    }

    Ok(report.applied_migrations().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_apply_once() {
        let mut conn = Connection::open_in_memory().unwrap();

        assert_eq!(run_migrations(&mut conn).unwrap(), 2);
        assert_eq!(run_migrations(&mut conn).unwrap(), 0);

        let professions: i64 = conn
            .query_row("SELECT COUNT(*) FROM professions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(professions, 20);

        let users_table: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(users_table, 0);
    }

    #[test]
    fn test_one_salary_per_user_and_quarter() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        let insert = "INSERT INTO salaries (id, user_id, value, currency, quarter, year, company, created_at)
                      VALUES (?1, ?2, 1.0, 1, 2, 2024, 1, '2024-05-01')";
        conn.execute(insert, rusqlite::params!["a", 1]).unwrap();
        assert!(conn.execute(insert, rusqlite::params!["b", 1]).is_err());

        // Imported records without an owner are not constrained
        conn.execute(insert, rusqlite::params!["c", Option::<i64>::None]).unwrap();
        conn.execute(insert, rusqlite::params!["d", Option::<i64>::None]).unwrap();
    }
}
