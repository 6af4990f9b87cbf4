use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use drill_core::{
    BestResult, CalculationMethod, DrillError, DrillResult, OperandLengths, Operands, Operation, Problem,
    RecordEntry, RecordFormat, RecordStore, ResolvedOperation, SetCategory, SetOverview,
    SolvedSet, StoreStats,
};

use crate::schema::init_db;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(path: &Path) -> DrillResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DrillError::Database(format!("cannot create db directory: {e}")))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| DrillError::Database(format!("cannot open database: {e}")))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| DrillError::Database(e.to_string()))?;
        init_db(&conn)?;
        tracing::debug!(path = %path.display(), "opened record store");
        Ok(Self { conn })
    }

    pub fn in_memory() -> DrillResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DrillError::Database(format!("cannot open in-memory db: {e}")))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| DrillError::Database(e.to_string()))?;
        init_db(&conn)?;
        Ok(Self { conn })
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn db_err(e: rusqlite::Error) -> DrillError {
    DrillError::Database(e.to_string())
}

/// Wrap a domain parse failure so it can surface from a row mapper.
fn conversion_err(idx: usize, e: DrillError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Reads `operation, first_length, second_length` starting at column `idx`.
fn row_to_category(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<SetCategory> {
    let operation: String = row.get(idx)?;
    let operation: Operation = operation.parse().map_err(|e| conversion_err(idx, e))?;
    let operand_lengths = OperandLengths::new(row.get(idx + 1)?, row.get(idx + 2)?)
        .map_err(|e| conversion_err(idx + 1, e))?;
    Ok(SetCategory {
        operation,
        operand_lengths,
    })
}

fn row_to_problem(row: &rusqlite::Row) -> rusqlite::Result<Problem> {
    let operation: String = row.get(0)?;
    let operation: ResolvedOperation = operation.parse().map_err(|e| conversion_err(0, e))?;
    let operand_lengths =
        OperandLengths::new(row.get(1)?, row.get(2)?).map_err(|e| conversion_err(1, e))?;
    let first: i64 = row.get(3)?;
    let second: i64 = row.get(4)?;
    let operands = Operands::new(operation, [first as u64, second as u64])
        .map_err(|e| conversion_err(3, e))?;
    let solved_at: String = row.get(6)?;
    Ok(Problem {
        operation,
        operand_lengths,
        operands: operands.operands,
        centiseconds: row.get(5)?,
        timestamp: parse_time(&solved_at),
    })
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<RecordEntry> {
    let category = row_to_category(row, 0)?;
    let method: String = row.get(4)?;
    let method: CalculationMethod = method.parse().map_err(|e| conversion_err(4, e))?;
    let format = RecordFormat::new(row.get(3)?, method).map_err(|e| conversion_err(3, e))?;
    let achieved_at: String = row.get(8)?;
    Ok(RecordEntry {
        category,
        format,
        centiseconds: row.get(5)?,
        set_id: row.get(6)?,
        start_index: row.get(7)?,
        achieved_at: parse_time(&achieved_at),
    })
}

const RECORD_COLS: &str = "operation, first_length, second_length, problem_count, \
                           calculation_method, centiseconds, set_id, start_index, achieved_at";

// ---------------------------------------------------------------------------
// RecordStore impl
// ---------------------------------------------------------------------------

impl RecordStore for SqliteStore {
    fn save_set(&self, set: &SolvedSet) -> DrillResult<String> {
        let tx = self.conn.unchecked_transaction().map_err(db_err)?;
        tx.execute(
            "INSERT INTO sets (id, operation, first_length, second_length, started_at, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                set.id,
                set.category.operation.to_string(),
                set.category.operand_lengths.first(),
                set.category.operand_lengths.second(),
                format_time(&set.started_at),
                format_time(&set.finished_at),
            ],
        )
        .map_err(db_err)?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO problems (set_id, position, operation, first_length, second_length,
                     first_operand, second_operand, centiseconds, solved_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(db_err)?;
            for (position, problem) in set.problems.iter().enumerate() {
                stmt.execute(params![
                    set.id,
                    position,
                    problem.operation.to_string(),
                    problem.operand_lengths.first(),
                    problem.operand_lengths.second(),
                    problem.operands[0] as i64,
                    problem.operands[1] as i64,
                    problem.centiseconds,
                    format_time(&problem.timestamp),
                ])
                .map_err(db_err)?;
            }
        }

        tx.commit().map_err(db_err)?;
        tracing::debug!(id = %set.id, problems = set.problems.len(), "saved set");
        Ok(set.id.clone())
    }

    fn get_set(&self, id: &str) -> DrillResult<Option<SolvedSet>> {
        let header = self
            .conn
            .query_row(
                "SELECT operation, first_length, second_length, started_at, finished_at
                 FROM sets WHERE id = ?1",
                params![id],
                |row| {
                    let category = row_to_category(row, 0)?;
                    let started_at: String = row.get(3)?;
                    let finished_at: String = row.get(4)?;
                    Ok((category, started_at, finished_at))
                },
            )
            .optional()
            .map_err(db_err)?;

        let Some((category, started_at, finished_at)) = header else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare(
                "SELECT operation, first_length, second_length, first_operand, second_operand,
                 centiseconds, solved_at
                 FROM problems WHERE set_id = ?1 ORDER BY position",
            )
            .map_err(db_err)?;
        let problems = stmt
            .query_map(params![id], row_to_problem)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        Ok(Some(SolvedSet {
            id: id.to_string(),
            category,
            started_at: parse_time(&started_at),
            finished_at: parse_time(&finished_at),
            problems,
        }))
    }

    fn delete_set(&self, id: &str) -> DrillResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM sets WHERE id = ?1", params![id])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DrillError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_sets(&self, limit: usize) -> DrillResult<Vec<SetOverview>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT s.id, s.operation, s.first_length, s.second_length, s.finished_at,
                 COUNT(p.position), COALESCE(SUM(p.centiseconds), 0)
                 FROM sets s LEFT JOIN problems p ON p.set_id = s.id
                 GROUP BY s.id
                 ORDER BY s.finished_at DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let finished_at: String = row.get(4)?;
                let total: i64 = row.get(6)?;
                Ok(SetOverview {
                    id: row.get(0)?,
                    category: row_to_category(row, 1)?,
                    finished_at: parse_time(&finished_at),
                    problem_count: row.get(5)?,
                    total_centiseconds: total as u64,
                })
            })
            .map_err(db_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn prior_bests(&self, category: &SetCategory) -> DrillResult<HashMap<RecordFormat, u32>> {
        Ok(self
            .list_records(Some(category))?
            .into_iter()
            .map(|r| (r.format, r.centiseconds))
            .collect())
    }

    fn record_bests(
        &self,
        category: &SetCategory,
        set_id: &str,
        bests: &[BestResult],
    ) -> DrillResult<usize> {
        let now = format_time(&Utc::now());
        let mut updated = 0;
        for best in bests.iter().filter(|b| b.is_new_record) {
            // Never replace a stored record with a slower one.
            updated += self
                .conn
                .execute(
                    "INSERT INTO records (operation, first_length, second_length, problem_count,
                     calculation_method, centiseconds, set_id, start_index, achieved_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT(operation, first_length, second_length, problem_count,
                                 calculation_method)
                     DO UPDATE SET centiseconds = excluded.centiseconds,
                                   set_id = excluded.set_id,
                                   start_index = excluded.start_index,
                                   achieved_at = excluded.achieved_at
                     WHERE excluded.centiseconds < records.centiseconds",
                    params![
                        category.operation.to_string(),
                        category.operand_lengths.first(),
                        category.operand_lengths.second(),
                        best.problem_count,
                        best.calculation_method.to_string(),
                        best.centiseconds,
                        set_id,
                        best.start_index,
                        now,
                    ],
                )
                .map_err(db_err)?;
        }
        tracing::debug!(category = %category, updated, "recorded bests");
        Ok(updated)
    }

    fn list_records(&self, category: Option<&SetCategory>) -> DrillResult<Vec<RecordEntry>> {
        let order = "ORDER BY operation, first_length, second_length, problem_count, \
                     calculation_method";
        let records = match category {
            Some(c) => {
                let mut stmt = self
                    .conn
                    .prepare(&format!(
                        "SELECT {RECORD_COLS} FROM records
                         WHERE operation = ?1 AND first_length = ?2 AND second_length = ?3 {order}"
                    ))
                    .map_err(db_err)?;
                let rows = stmt
                    .query_map(
                        params![
                            c.operation.to_string(),
                            c.operand_lengths.first(),
                            c.operand_lengths.second()
                        ],
                        row_to_record,
                    )
                    .map_err(db_err)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(db_err)?
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("SELECT {RECORD_COLS} FROM records {order}"))
                    .map_err(db_err)?;
                let rows = stmt.query_map([], row_to_record).map_err(db_err)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(db_err)?
            }
        };
        Ok(records)
    }

    fn stats(&self) -> DrillResult<StoreStats> {
        let count = |sql: &str| -> DrillResult<usize> {
            self.conn
                .query_row(sql, [], |row| row.get(0))
                .map_err(db_err)
        };
        let total_sets = count("SELECT COUNT(*) FROM sets")?;
        let total_problems = count("SELECT COUNT(*) FROM problems")?;
        let total_records = count("SELECT COUNT(*) FROM records")?;

        let (first, last): (Option<String>, Option<String>) = self
            .conn
            .query_row(
                "SELECT MIN(finished_at), MAX(finished_at) FROM sets",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(db_err)?;

        Ok(StoreStats {
            total_sets,
            total_problems,
            total_records,
            first_set: first.as_deref().map(parse_time),
            last_set: last.as_deref().map(parse_time),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::{compute_bests, Operands};
    use std::time::Duration;

    fn test_store() -> SqliteStore {
        SqliteStore::in_memory().unwrap()
    }

    fn category(operation: Operation, a: u32, b: u32) -> SetCategory {
        SetCategory {
            operation,
            operand_lengths: OperandLengths::new(a, b).unwrap(),
        }
    }

    fn make_set(category: SetCategory, times_ms: &[u64]) -> SolvedSet {
        let problems = times_ms
            .iter()
            .map(|&ms| {
                Problem::new(
                    Operands {
                        operation: ResolvedOperation::Multiplication,
                        operands: [7, 8],
                    },
                    category.operand_lengths,
                    Duration::from_millis(ms),
                )
            })
            .collect();
        SolvedSet::new(category, Utc::now(), problems)
    }

    fn catalog() -> Vec<RecordFormat> {
        vec![RecordFormat::SINGLE, RecordFormat::average(5).unwrap()]
    }

    #[test]
    fn test_save_and_get_set() {
        let store = test_store();
        let set = make_set(category(Operation::Multiplication, 1, 1), &[1000, 2000, 1500]);
        let id = store.save_set(&set).unwrap();

        let loaded = store.get_set(&id).unwrap().unwrap();
        assert_eq!(loaded.category, set.category);
        assert_eq!(loaded.problems.len(), 3);
        assert_eq!(loaded.problems[1].centiseconds, 200);
        assert_eq!(loaded.problems[2].operands, [7, 8]);
        assert_eq!(loaded.problems[0].operation, ResolvedOperation::Multiplication);
    }

    #[test]
    fn test_large_operands_round_trip() {
        let store = test_store();
        let mut set = make_set(category(Operation::Addition, 18, 18), &[100]);
        set.problems[0].operation = ResolvedOperation::Addition;
        set.problems[0].operands = [999_999_999_999_999_999, 100_000_000_000_000_000];
        store.save_set(&set).unwrap();
        let loaded = store.get_set(&set.id).unwrap().unwrap();
        assert_eq!(loaded.problems[0].operands, set.problems[0].operands);
    }

    #[test]
    fn test_zero_divisor_row_is_rejected() {
        let store = test_store();
        let mut set = make_set(category(Operation::Division, 2, 1), &[100]);
        set.problems[0].operation = ResolvedOperation::Division;
        set.problems[0].operands = [12, 4];
        store.save_set(&set).unwrap();
        store
            .conn
            .execute(
                "UPDATE problems SET second_operand = 0 WHERE set_id = ?1",
                params![set.id],
            )
            .unwrap();
        assert!(matches!(store.get_set(&set.id), Err(DrillError::Database(_))));
    }

    #[test]
    fn test_get_set_not_found() {
        let store = test_store();
        assert!(store.get_set("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_delete_set() {
        let store = test_store();
        let set = make_set(category(Operation::Addition, 2, 2), &[1000]);
        store.save_set(&set).unwrap();
        store.delete_set(&set.id).unwrap();
        assert!(store.get_set(&set.id).unwrap().is_none());
        assert_eq!(store.stats().unwrap().total_problems, 0);
        assert!(matches!(store.delete_set(&set.id), Err(DrillError::NotFound(_))));
    }

    #[test]
    fn test_list_sets_newest_first() {
        let store = test_store();
        let cat = category(Operation::Division, 2, 1);
        let first = make_set(cat, &[1000, 1000]);
        store.save_set(&first).unwrap();
        let mut second = make_set(cat, &[500]);
        second.finished_at = first.finished_at + chrono::Duration::seconds(5);
        store.save_set(&second).unwrap();

        let sets = store.list_sets(10).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].id, second.id);
        assert_eq!(sets[1].problem_count, 2);
        assert_eq!(sets[1].total_centiseconds, 200);
        assert_eq!(store.list_sets(1).unwrap().len(), 1);
    }

    #[test]
    fn test_prior_bests_empty() {
        let store = test_store();
        let bests = store.prior_bests(&category(Operation::Addition, 1, 1)).unwrap();
        assert!(bests.is_empty());
    }

    #[test]
    fn test_record_bests_round_trip() {
        let store = test_store();
        let cat = category(Operation::Multiplication, 2, 1);
        let set = make_set(cat, &[1000, 2000, 3000, 4000, 10_000]);
        store.save_set(&set).unwrap();

        let history = store.prior_bests(&cat).unwrap();
        let bests = compute_bests(&set.problems, &catalog(), &history);
        assert!(bests.iter().all(|b| b.is_new_record));
        assert_eq!(store.record_bests(&cat, &set.id, &bests).unwrap(), 2);

        let history = store.prior_bests(&cat).unwrap();
        assert_eq!(history.get(&RecordFormat::SINGLE), Some(&100));
        assert_eq!(history.get(&RecordFormat::average(5).unwrap()), Some(&300));

        // Same times again: ties are not records.
        let again = make_set(cat, &[1000, 2000, 3000, 4000, 10_000]);
        let bests = compute_bests(&again.problems, &catalog(), &history);
        assert!(bests.iter().all(|b| !b.is_new_record));
        assert_eq!(store.record_bests(&cat, &again.id, &bests).unwrap(), 0);
    }

    #[test]
    fn test_record_bests_never_regress() {
        let store = test_store();
        let cat = category(Operation::Addition, 1, 1);
        let fast = make_set(cat, &[500]);
        let slow = make_set(cat, &[900]);

        let bests = compute_bests(&fast.problems, &catalog(), &drill_core::NoHistory);
        store.record_bests(&cat, &fast.id, &bests).unwrap();
        // Claimed as new without consulting history; the store keeps the faster one.
        let bests = compute_bests(&slow.problems, &catalog(), &drill_core::NoHistory);
        assert_eq!(store.record_bests(&cat, &slow.id, &bests).unwrap(), 0);

        let records = store.list_records(Some(&cat)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].centiseconds, 50);
        assert_eq!(records[0].set_id, fast.id);
    }

    #[test]
    fn test_records_scoped_by_category() {
        let store = test_store();
        let one = category(Operation::Multiplication, 1, 1);
        let two = category(Operation::Multiplication, 2, 2);
        let set = make_set(one, &[400]);
        let bests = compute_bests(&set.problems, &catalog(), &drill_core::NoHistory);
        store.record_bests(&one, &set.id, &bests).unwrap();

        assert!(store.prior_bests(&two).unwrap().is_empty());
        assert_eq!(store.list_records(None).unwrap().len(), 1);
        assert_eq!(store.list_records(Some(&one)).unwrap()[0].format, RecordFormat::SINGLE);
    }

    #[test]
    fn test_stats() {
        let store = test_store();
        let empty = store.stats().unwrap();
        assert_eq!(empty.total_sets, 0);
        assert!(empty.first_set.is_none());

        let cat = category(Operation::All, 2, 2);
        let set = make_set(cat, &[100, 200]);
        store.save_set(&set).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_sets, 1);
        assert_eq!(stats.total_problems, 2);
        assert_eq!(stats.total_records, 0);
        assert!(stats.last_set.is_some());
    }

    #[test]
    fn test_on_disk_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("drill.db");
        let cat = category(Operation::Subtraction, 3, 2);
        let set = make_set(cat, &[1200]);
        {
            let store = SqliteStore::new(&path).unwrap();
            store.save_set(&set).unwrap();
        }
        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.get_set(&set.id).unwrap().unwrap().problems.len(), 1);
    }
}
