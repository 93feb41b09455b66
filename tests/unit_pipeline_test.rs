// tests/unit_pipeline_test.rs

//! Pipeline batching: positional replies, error capture, MULTI/EXEC framing.

mod common;

use cinnabar::{CinnabarError, CommandExecutor, Connection, Pipeline, RespFrame};
use common::{ScriptedConn, listener_and_config};

#[tokio::test]
async fn test_flush_returns_positional_replies_with_errors_as_values() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["SET", "a", "1"]).await.unwrap();
        conn.expect(&["SET", "b", "2"]).await.unwrap();
        conn.expect(&["GET", "a"]).await.unwrap();
        conn.expect(&["LPUSH", "a", "x"]).await.unwrap();
        conn.expect(&["GET", "b"]).await.unwrap();
        conn.reply("+OK\r\n").await.unwrap();
        conn.reply("+OK\r\n").await.unwrap();
        conn.reply("$1\r\n1\r\n").await.unwrap();
        conn.reply("-WRONGTYPE Operation against a key holding the wrong kind of value\r\n")
            .await
            .unwrap();
        conn.reply("$1\r\n2\r\n").await.unwrap();
    });

    let mut conn = Connection::new(config);
    conn.connect().await.unwrap();

    let pipeline = Pipeline::new();
    pipeline.queue("SET", vec!["a".into(), "1".into()]);
    pipeline.queue("SET", vec!["b".into(), "2".into()]);
    pipeline.queue("GET", vec!["a".into()]);
    pipeline.queue("LPUSH", vec!["a".into(), "x".into()]);
    pipeline.queue("GET", vec!["b".into()]);
    assert_eq!(pipeline.len(), 5);

    let replies = pipeline.flush(&mut conn).await.unwrap();
    assert_eq!(replies.len(), 5);
    assert_eq!(replies[0], Ok(RespFrame::SimpleString("OK".to_string())));
    assert_eq!(replies[1], Ok(RespFrame::SimpleString("OK".to_string())));
    assert_eq!(
        replies[2],
        Ok(RespFrame::BulkString(bytes::Bytes::from_static(b"1")))
    );
    assert!(matches!(replies[3], Err(CinnabarError::ErrorReply(_))));
    assert_eq!(
        replies[4],
        Ok(RespFrame::BulkString(bytes::Bytes::from_static(b"2")))
    );

    // The queue was snapshotted and cleared.
    assert!(pipeline.is_empty());
    server.await.unwrap();
}

#[tokio::test]
async fn test_transactional_flush_frames_multi_then_commands_then_exec() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["MULTI"]).await.unwrap();
        conn.expect(&["INCR", "c"]).await.unwrap();
        conn.expect(&["INCR", "c"]).await.unwrap();
        conn.expect(&["EXEC"]).await.unwrap();
        conn.reply("+OK\r\n+QUEUED\r\n+QUEUED\r\n*2\r\n:1\r\n:2\r\n")
            .await
            .unwrap();
    });

    let mut conn = Connection::new(config);
    conn.connect().await.unwrap();

    let pipeline = Pipeline::transactional();
    pipeline.queue("INCR", vec!["c".into()]);
    pipeline.queue("INCR", vec!["c".into()]);

    let replies = pipeline.flush(&mut conn).await.unwrap();
    assert_eq!(replies.len(), 4);
    assert_eq!(replies[0], Ok(RespFrame::SimpleString("OK".to_string())));
    assert_eq!(replies[1], Ok(RespFrame::SimpleString("QUEUED".to_string())));
    assert_eq!(replies[2], Ok(RespFrame::SimpleString("QUEUED".to_string())));
    assert_eq!(
        replies[3],
        Ok(RespFrame::Array(vec![
            RespFrame::Integer(1),
            RespFrame::Integer(2)
        ]))
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_flush_transaction_surfaces_the_exec_array() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        for _ in 0..4 {
            let _ = conn.next_command().await.unwrap();
        }
        conn.reply("+OK\r\n+QUEUED\r\n+QUEUED\r\n*2\r\n:1\r\n:2\r\n")
            .await
            .unwrap();
    });

    let mut conn = Connection::new(config);
    conn.connect().await.unwrap();

    let pipeline = Pipeline::transactional();
    pipeline.queue("INCR", vec!["c".into()]);
    pipeline.queue("INCR", vec!["c".into()]);

    let results = pipeline.flush_transaction(&mut conn).await.unwrap();
    assert_eq!(
        results,
        Some(vec![RespFrame::Integer(1), RespFrame::Integer(2)])
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_discarded_transaction_yields_none() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        for _ in 0..3 {
            let _ = conn.next_command().await.unwrap();
        }
        // WATCH failed: EXEC answers with a null array.
        conn.reply("+OK\r\n+QUEUED\r\n*-1\r\n").await.unwrap();
    });

    let mut conn = Connection::new(config);
    conn.connect().await.unwrap();

    let pipeline = Pipeline::transactional();
    pipeline.queue("INCR", vec!["c".into()]);
    let results = pipeline.flush_transaction(&mut conn).await.unwrap();
    assert_eq!(results, None);
    server.await.unwrap();
}

#[tokio::test]
async fn test_empty_flush_is_a_no_op() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let _conn = ScriptedConn::accept(&listener).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    });

    let mut conn = Connection::new(config);
    conn.connect().await.unwrap();

    let pipeline = Pipeline::new();
    let replies = pipeline.flush(&mut conn).await.unwrap();
    assert!(replies.is_empty());
    server.abort();
}

#[tokio::test]
async fn test_executor_submissions_queue_and_resolve_with_sentinel() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["SET", "k", "v"]).await.unwrap();
        conn.expect(&["GET", "k"]).await.unwrap();
        conn.reply("+OK\r\n$1\r\nv\r\n").await.unwrap();
    });

    let mut conn = Connection::new(config);
    conn.connect().await.unwrap();

    let pipeline = Pipeline::new();
    // Submissions through the executor seam resolve immediately.
    let sentinel = pipeline
        .execute("SET", vec!["k".into(), "v".into()])
        .await
        .unwrap();
    assert_eq!(sentinel, RespFrame::SimpleString("OK".to_string()));
    pipeline.execute("GET", vec!["k".into()]).await.unwrap();

    let replies = pipeline.flush(&mut conn).await.unwrap();
    assert_eq!(replies.len(), 2);
    server.await.unwrap();
}
