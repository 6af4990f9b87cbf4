use rusqlite::Connection;

use drill_core::DrillError;

pub fn init_db(conn: &Connection) -> Result<(), DrillError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sets (
            id TEXT PRIMARY KEY,
            operation TEXT NOT NULL,
            first_length INTEGER NOT NULL,
            second_length INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sets_finished ON sets(finished_at);
        CREATE INDEX IF NOT EXISTS idx_sets_category
            ON sets(operation, first_length, second_length);

        CREATE TABLE IF NOT EXISTS problems (
            set_id TEXT NOT NULL REFERENCES sets(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            operation TEXT NOT NULL, -- resolved, never 'all'
            first_length INTEGER NOT NULL,
            second_length INTEGER NOT NULL,
            first_operand INTEGER NOT NULL,
            second_operand INTEGER NOT NULL,
            centiseconds INTEGER NOT NULL,
            solved_at TEXT NOT NULL,
            PRIMARY KEY (set_id, position)
        );

        -- One row per (category, format). set_id is not a foreign key so a
        -- record outlives the set it was set in.
        CREATE TABLE IF NOT EXISTS records (
            operation TEXT NOT NULL,
            first_length INTEGER NOT NULL,
            second_length INTEGER NOT NULL,
            problem_count INTEGER NOT NULL,
            calculation_method TEXT NOT NULL,
            centiseconds INTEGER NOT NULL,
            set_id TEXT NOT NULL,
            start_index INTEGER NOT NULL,
            achieved_at TEXT NOT NULL,
            PRIMARY KEY (operation, first_length, second_length, problem_count, calculation_method)
        );
        ",
    )
    .map_err(|e| DrillError::Database(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        // Second call should be idempotent
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_tables_exist() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();

        let tables: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .map(|r| r.unwrap())
                .collect()
        };

        assert_eq!(tables, vec!["problems", "records", "sets"]);
    }
}
