use serde_json::json;
use sqlite_batch::prelude::*;
use tokio::runtime::Runtime;

#[test]
fn test3_worker_executes_batches() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let rt = Runtime::new()?;
    rt.block_on(async move {
        let conn = BatchConnection::open(&BatchOptions::in_memory())?;

        let response = conn
            .execute_batch(
                BatchRequest::default()
                    .push("CREATE TABLE t (x)", vec![])
                    .push("INSERT INTO t VALUES (?)", vec![1.into()])
                    .push("SELECT * FROM t", vec![]),
            )
            .await?;
        assert_eq!(response.len(), 3);
        assert_eq!(
            response.results[2].as_rows().map(|r| r.rows.clone()),
            Some(vec![vec![CellValue::Double(1.0)]])
        );

        // the connection persists between batches
        let count = conn
            .with_connection(|raw| {
                let n: i64 = raw.query_row("SELECT count(*) FROM t", [], |row| row.get(0))?;
                Ok(n)
            })
            .await?;
        assert_eq!(count, 1);
        Ok::<(), BatchError>(())
    })?;
    Ok(())
}

#[test]
fn test3_worker_json_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async move {
        let conn = BatchConnection::open(&BatchOptions::in_memory())?;
        let response = conn
            .execute_json(&json!([
                ["CREATE TABLE t (x)", []],
                ["INSERT INTO t VALUES (?)", [1]],
                ["SELECT * FROM t", []],
                ["SELECT * FROM missing", []]
            ]))
            .await?;

        assert_eq!(response[1]["totalChanges"], json!(1));
        assert_eq!(response[1]["rowsAffected"], json!(1));
        assert_eq!(response[1]["lastInsertRowId"], json!(1));
        assert_eq!(response[2], json!({"status": 0, "columns": ["x"], "rows": [[1.0]]}));
        assert_eq!(response[3]["status"], json!(1));

        let malformed = conn.execute_json(&json!([["SELECT 1", []], [42]])).await;
        assert!(matches!(malformed, Err(BatchError::MalformedRequest(_))));

        // a missing bind list rejects the whole batch before anything runs
        let missing_binds = conn
            .execute_json(&json!([["INSERT INTO t VALUES (2)", []], ["SELECT 1"]]))
            .await;
        assert!(matches!(missing_binds, Err(BatchError::MalformedRequest(_))));
        let count = conn
            .with_connection(|raw| {
                let n: i64 = raw.query_row("SELECT count(*) FROM t", [], |row| row.get(0))?;
                Ok(n)
            })
            .await?;
        assert_eq!(count, 1);
        Ok::<(), BatchError>(())
    })?;
    Ok(())
}

#[test]
fn test3_worker_streams_bounded_messages() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async move {
        let options = BatchOptions::builder(":memory:")
            .rough_cutoff_size(256)
            .finish();
        let conn = BatchConnection::open(&options)?;
        assert_eq!(conn.rough_cutoff_size(), 256);

        let mut request = BatchRequest::default().push("CREATE TABLE t (x)", vec![]);
        for i in 0..40 {
            request = request.push("INSERT INTO t VALUES (?)", vec![format!("value {i}").into()]);
        }
        request = request.push("SELECT x FROM t", vec![]);

        let mut receiver = conn.stream_batch(request)?;
        let mut messages = Vec::new();
        while let Some(message) = receiver.recv().await {
            messages.push(message?);
        }

        assert_eq!(messages.iter().filter(|m| m.is_last()).count(), 1);
        assert!(messages.last().is_some_and(OutboundMessage::is_last));
        let header = messages
            .iter()
            .find(|m| m.kind == MessageKind::PartialHeader)
            .ok_or_else(|| BatchError::Other("missing partial header".into()))?;
        let rows_length = header.payload_json()?["rowsLength"].as_u64();
        assert_eq!(rows_length, Some(40));
        Ok::<(), BatchError>(())
    })?;
    Ok(())
}

#[test]
fn test3_file_backed_connection() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("batch.db");
    let path = path.to_string_lossy().into_owned();

    let rt = Runtime::new()?;
    rt.block_on(async {
        let conn = BatchConnection::open(&BatchOptions::new(path.clone()))?;
        conn.execute_batch(
            BatchRequest::default()
                .push("CREATE TABLE t (x)", vec![])
                .push("INSERT INTO t VALUES ('kept')", vec![]),
        )
        .await?;
        Ok::<(), BatchError>(())
    })?;

    let reopened = rusqlite::Connection::open(&path)?;
    let value: String = reopened.query_row("SELECT x FROM t", [], |row| row.get(0))?;
    assert_eq!(value, "kept");
    Ok(())
}

#[test]
fn test3_options_validation() {
    let options = BatchOptions::builder(":memory:")
        .rough_cutoff_size(0)
        .finish();
    assert!(matches!(
        BatchConnection::open(&options),
        Err(BatchError::ConfigError(_))
    ));

    let options = BatchOptions::builder("/nonexistent-dir/sub/batch.db")
        .flags(rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)
        .finish();
    assert!(matches!(
        options.open(),
        Err(BatchError::ConnectionError(_))
    ));
}

#[cfg(not(feature = "sqlcipher"))]
#[test]
fn test3_key_without_encryption_support_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("secret.db");
    let options = BatchOptions::builder(path.to_string_lossy())
        .key("hunter2")
        .finish();

    assert!(matches!(
        BatchConnection::open(&options),
        Err(BatchError::ConfigError(msg)) if msg.starts_with("password key error")
    ));

    // an empty key means no encryption
    let options = BatchOptions::builder(path.to_string_lossy()).key("").finish();
    assert!(options.open().is_ok());
    Ok(())
}

#[cfg(feature = "sqlcipher")]
#[test]
fn test3_keyed_database_is_encrypted() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("secret.db");
    let keyed = |key: &str| {
        BatchOptions::builder(path.to_string_lossy())
            .key(key)
            .finish()
    };

    {
        let conn = keyed("hunter2").open()?;
        let response = sqlite_batch::execute_batch(
            &conn,
            &BatchRequest::default()
                .push("CREATE TABLE t (x)", vec![])
                .push("INSERT INTO t VALUES (?)", vec!["plaintext-secret".into()]),
        )?;
        assert!(response.results.iter().all(|r| !r.is_error()));
    }

    let header = std::fs::read(&path)?;
    assert!(!header.starts_with(b"SQLite format 3\0"));

    let plain = rusqlite::Connection::open(&path)?;
    assert!(plain
        .query_row("SELECT x FROM t", [], |row| row.get::<_, String>(0))
        .is_err());

    assert!(matches!(
        keyed("wrong").open(),
        Err(BatchError::ConfigError(_))
    ));

    let conn = keyed("hunter2").open()?;
    let value: String = conn.query_row("SELECT x FROM t", [], |row| row.get(0))?;
    assert_eq!(value, "plaintext-secret");
    Ok(())
}
