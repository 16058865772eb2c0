use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusqlite::Connection;
use sqlite_batch::prelude::*;

fn random_bind(rng: &mut ChaCha8Rng) -> BindValue {
    match rng.random_range(0..4) {
        0 => BindValue::Numeric(f64::from(rng.random_range(-1_000_000_i32..1_000_000))),
        1 => BindValue::Numeric(f64::from(rng.random_range(-1000_i32..1000)) / 8.0),
        2 => BindValue::Text(format!("s{}", rng.random_range(0..10_000))),
        _ => BindValue::Null,
    }
}

fn expected_cell(bind: &BindValue) -> CellValue {
    match bind {
        BindValue::Numeric(n) => CellValue::Double(*n),
        BindValue::Text(s) => CellValue::Text(s.clone()),
        BindValue::Null => CellValue::Null,
    }
}

#[test]
fn test5_random_tables_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for round in 0..25 {
        let conn = Connection::open_in_memory()?;
        let column_count = rng.random_range(1..7);
        let row_count = rng.random_range(1..40);

        let columns: Vec<String> = (0..column_count).map(|c| format!("c{c}")).collect();
        let placeholders = vec!["?"; column_count].join(", ");

        let mut request = BatchRequest::default()
            .push(format!("CREATE TABLE t{round} ({})", columns.join(", ")), vec![]);
        let mut inserted = Vec::with_capacity(row_count);
        for _ in 0..row_count {
            let binds: Vec<BindValue> = (0..column_count).map(|_| random_bind(&mut rng)).collect();
            inserted.push(binds.iter().map(expected_cell).collect::<Vec<_>>());
            request = request.push(format!("INSERT INTO t{round} VALUES ({placeholders})"), binds);
        }
        request = request.push(format!("SELECT * FROM t{round} ORDER BY rowid"), vec![]);

        let response = execute_batch(&conn, &request)?;
        assert_eq!(response.len(), request.len());

        let rows = response
            .results
            .last()
            .and_then(EntryResult::as_rows)
            .ok_or("missing rows result")?;
        assert_eq!(rows.columns, columns);
        assert!(rows.rows.iter().all(|row| row.len() == rows.columns.len()));
        assert_eq!(rows.rows, inserted, "round {round}");

        let total_affected: i64 = response
            .results
            .iter()
            .filter_map(EntryResult::as_command)
            .map(|c| c.rows_affected)
            .sum();
        assert_eq!(total_affected, row_count as i64);
    }
    Ok(())
}

#[test]
fn test5_integral_doubles_are_exact() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("CREATE TABLE n (i INTEGER, r REAL);")?;

    let mut request = BatchRequest::default();
    let mut expected = Vec::new();
    for _ in 0..50 {
        let value = rng.random_range(-(1_i64 << 53)..(1_i64 << 53)) as f64;
        expected.push(vec![CellValue::Double(value), CellValue::Double(value)]);
        request = request.push("INSERT INTO n VALUES (?, ?)", vec![value.into(), value.into()]);
    }
    request = request.push("SELECT i, r FROM n ORDER BY rowid", vec![]);

    let response = execute_batch(&conn, &request)?;
    let rows = response
        .results
        .last()
        .and_then(EntryResult::as_rows)
        .ok_or("missing rows result")?;
    assert_eq!(rows.rows, expected);
    Ok(())
}
