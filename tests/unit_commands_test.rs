// tests/unit_commands_test.rs

//! The typed command surface, end to end against a scripted server.

mod common;

use bytes::Bytes;
use cinnabar::{
    HashCommands, KeyCommands, ListCommands, Multiplexer, PubSubCommands, ScanCommands,
    SetCommands, SortedSetCommands, StreamCommands, StreamId, StreamIdSpec, StringCommands,
};
use common::{ScriptedConn, listener_and_config};

#[tokio::test]
async fn test_set_then_get_round_trip() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["SET", "k", "v"]).await.unwrap();
        conn.reply("+OK\r\n").await.unwrap();
        conn.expect(&["GET", "k"]).await.unwrap();
        conn.reply("$1\r\nv\r\n").await.unwrap();
        conn.expect(&["GET", "missing"]).await.unwrap();
        conn.reply("$-1\r\n").await.unwrap();
    });

    let mux = Multiplexer::connect(config).await.unwrap();
    mux.set("k", "v").await.unwrap();
    assert_eq!(mux.get("k").await.unwrap(), Some(Bytes::from_static(b"v")));
    assert_eq!(mux.get("missing").await.unwrap(), None);
    server.await.unwrap();
}

#[tokio::test]
async fn test_counters_and_mget() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["INCR", "hits"]).await.unwrap();
        conn.reply(":1\r\n").await.unwrap();
        conn.expect(&["INCRBY", "hits", "9"]).await.unwrap();
        conn.reply(":10\r\n").await.unwrap();
        conn.expect(&["MGET", "hits", "nope"]).await.unwrap();
        conn.reply("*2\r\n$2\r\n10\r\n$-1\r\n").await.unwrap();
    });

    let mux = Multiplexer::connect(config).await.unwrap();
    assert_eq!(mux.incr("hits").await.unwrap(), 1);
    assert_eq!(mux.incr_by("hits", 9).await.unwrap(), 10);
    assert_eq!(
        mux.mget(&["hits", "nope"]).await.unwrap(),
        vec![Some(Bytes::from_static(b"10")), None]
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_hash_list_and_set_families() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["HSET", "h", "f1", "v1", "f2", "v2"]).await.unwrap();
        conn.reply(":2\r\n").await.unwrap();
        conn.expect(&["HGETALL", "h"]).await.unwrap();
        conn.reply("*4\r\n$2\r\nf1\r\n$2\r\nv1\r\n$2\r\nf2\r\n$2\r\nv2\r\n")
            .await
            .unwrap();
        conn.expect(&["LPUSH", "l", "x", "y"]).await.unwrap();
        conn.reply(":2\r\n").await.unwrap();
        conn.expect(&["LRANGE", "l", "0", "-1"]).await.unwrap();
        conn.reply("*2\r\n$1\r\ny\r\n$1\r\nx\r\n").await.unwrap();
        conn.expect(&["SADD", "s", "m"]).await.unwrap();
        conn.reply(":1\r\n").await.unwrap();
        conn.expect(&["SISMEMBER", "s", "m"]).await.unwrap();
        conn.reply(":1\r\n").await.unwrap();
    });

    let mux = Multiplexer::connect(config).await.unwrap();
    assert_eq!(mux.hset("h", &[("f1", "v1"), ("f2", "v2")]).await.unwrap(), 2);
    assert_eq!(
        mux.hgetall("h").await.unwrap(),
        vec![
            (Bytes::from_static(b"f1"), Bytes::from_static(b"v1")),
            (Bytes::from_static(b"f2"), Bytes::from_static(b"v2")),
        ]
    );
    assert_eq!(mux.lpush("l", &["x", "y"]).await.unwrap(), 2);
    assert_eq!(
        mux.lrange("l", 0, -1).await.unwrap(),
        vec![Bytes::from_static(b"y"), Bytes::from_static(b"x")]
    );
    assert_eq!(mux.sadd("s", &["m"]).await.unwrap(), 1);
    assert!(mux.sismember("s", "m").await.unwrap());
    server.await.unwrap();
}

#[tokio::test]
async fn test_sorted_set_scores() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["ZADD", "board", "1.5", "alice", "2", "bob"])
            .await
            .unwrap();
        conn.reply(":2\r\n").await.unwrap();
        conn.expect(&["ZSCORE", "board", "alice"]).await.unwrap();
        conn.reply("$3\r\n1.5\r\n").await.unwrap();
        conn.expect(&["ZRANGE", "board", "0", "-1", "WITHSCORES"])
            .await
            .unwrap();
        conn.reply("*4\r\n$5\r\nalice\r\n$3\r\n1.5\r\n$3\r\nbob\r\n$1\r\n2\r\n")
            .await
            .unwrap();
        conn.expect(&["ZRANK", "board", "ghost"]).await.unwrap();
        conn.reply("$-1\r\n").await.unwrap();
    });

    let mux = Multiplexer::connect(config).await.unwrap();
    assert_eq!(
        mux.zadd("board", &[(1.5, "alice"), (2.0, "bob")]).await.unwrap(),
        2
    );
    assert_eq!(mux.zscore("board", "alice").await.unwrap(), Some(1.5));
    assert_eq!(
        mux.zrange_withscores("board", 0, -1).await.unwrap(),
        vec![
            (Bytes::from_static(b"alice"), 1.5),
            (Bytes::from_static(b"bob"), 2.0),
        ]
    );
    assert_eq!(mux.zrank("board", "ghost").await.unwrap(), None);
    server.await.unwrap();
}

#[tokio::test]
async fn test_stream_add_len_and_range() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["XADD", "S", "*", "k", "v"]).await.unwrap();
        conn.reply("$15\r\n1700000000000-0\r\n").await.unwrap();
        conn.expect(&["XLEN", "S"]).await.unwrap();
        conn.reply(":1\r\n").await.unwrap();
        conn.expect(&["XRANGE", "S", "-", "+"]).await.unwrap();
        conn.reply("*1\r\n*2\r\n$15\r\n1700000000000-0\r\n*2\r\n$1\r\nk\r\n$1\r\nv\r\n")
            .await
            .unwrap();
    });

    let mux = Multiplexer::connect(config).await.unwrap();
    let id = mux.xadd("S", StreamIdSpec::Auto, &[("k", "v")]).await.unwrap();
    assert!(id.timestamp_ms > 0);
    assert_eq!(id.sequence, 0);

    assert_eq!(mux.xlen("S").await.unwrap(), 1);

    let entries = mux
        .xrange("S", StreamIdSpec::Min, StreamIdSpec::Max)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    assert_eq!(
        entries[0].fields.get(&Bytes::from_static(b"k")),
        Some(&Bytes::from_static(b"v"))
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_consumer_group_read_and_ack() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["XGROUP", "CREATE", "S", "workers", "$", "MKSTREAM"])
            .await
            .unwrap();
        conn.reply("+OK\r\n").await.unwrap();
        conn.expect(&[
            "XREADGROUP", "GROUP", "workers", "w1", "COUNT", "10", "STREAMS", "S", ">",
        ])
        .await
        .unwrap();
        conn.reply("*1\r\n*2\r\n$1\r\nS\r\n*1\r\n*2\r\n$3\r\n5-0\r\n*2\r\n$1\r\nk\r\n$1\r\nv\r\n")
            .await
            .unwrap();
        conn.expect(&["XACK", "S", "workers", "5-0"]).await.unwrap();
        conn.reply(":1\r\n").await.unwrap();
    });

    let mux = Multiplexer::connect(config).await.unwrap();
    mux.xgroup_create("S", "workers", StreamIdSpec::Tail).await.unwrap();

    let groups = mux
        .xreadgroup("workers", "w1", &[("S", StreamIdSpec::Unseen)], Some(10))
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].0, Bytes::from_static(b"S"));
    assert_eq!(groups[0].1[0].id, StreamId::new(5, 0));

    assert_eq!(
        mux.xack("S", "workers", &[StreamId::new(5, 0)]).await.unwrap(),
        1
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_scan_walks_the_cursor() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["SCAN", "0", "MATCH", "user:*", "COUNT", "100"])
            .await
            .unwrap();
        conn.reply("*2\r\n$2\r\n17\r\n*2\r\n$6\r\nuser:1\r\n$6\r\nuser:2\r\n")
            .await
            .unwrap();
        conn.expect(&["SCAN", "17", "MATCH", "user:*", "COUNT", "100"])
            .await
            .unwrap();
        conn.reply("*2\r\n$1\r\n0\r\n*1\r\n$6\r\nuser:3\r\n")
            .await
            .unwrap();
    });

    let mux = Multiplexer::connect(config).await.unwrap();
    let (cursor, keys) = mux.scan(0, Some("user:*"), Some(100)).await.unwrap();
    assert_eq!(cursor, 17);
    assert_eq!(keys.len(), 2);

    let (cursor, keys) = mux.scan(cursor, Some("user:*"), Some(100)).await.unwrap();
    assert_eq!(cursor, 0);
    assert_eq!(keys, vec![Bytes::from_static(b"user:3")]);
    server.await.unwrap();
}

#[tokio::test]
async fn test_publish_and_keyspace_commands() {
    let (listener, config) = listener_and_config().await;

    let server = tokio::spawn(async move {
        let mut conn = ScriptedConn::accept(&listener).await.unwrap();
        conn.expect(&["PUBLISH", "news", "hello"]).await.unwrap();
        conn.reply(":3\r\n").await.unwrap();
        conn.expect(&["DEL", "a", "b"]).await.unwrap();
        conn.reply(":2\r\n").await.unwrap();
        conn.expect(&["TTL", "a"]).await.unwrap();
        conn.reply(":-2\r\n").await.unwrap();
        conn.expect(&["TYPE", "b"]).await.unwrap();
        conn.reply("+string\r\n").await.unwrap();
    });

    let mux = Multiplexer::connect(config).await.unwrap();
    assert_eq!(mux.publish("news", "hello").await.unwrap(), 3);
    assert_eq!(mux.del(&["a", "b"]).await.unwrap(), 2);
    assert_eq!(mux.ttl("a").await.unwrap(), -2);
    assert_eq!(mux.key_type("b").await.unwrap(), "string");
    server.await.unwrap();
}
