mod common;

use common::{MockServer, Reply};
use rqlite_client::prelude::*;

fn connect(server: &MockServer) -> Connection {
    ConnectOptions::new(server.host(), server.port())
        .connect()
        .expect("connect")
}

fn insert_envelope() -> String {
    r#"{"results":[{"last_insert_id":1,"rows_affected":1}]}"#.to_string()
}

fn two_row_select_envelope() -> String {
    r#"{"results":[{"columns":["id","name"],"types":["integer","text"],"values":[[1,"fiona"],[2,"declan"]]}]}"#
        .to_string()
}

#[tokio::test]
async fn insert_reports_rowcount_and_lastrowid() {
    let server = MockServer::start(vec![Reply::Json(insert_envelope())]).await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    cursor
        .execute(
            "insert into t(name) values (?)",
            Some(vec![SqlValue::Text("foo".into())].into()),
        )
        .await
        .expect("execute");

    assert_eq!(cursor.rowcount(), 1);
    assert_eq!(cursor.lastrowid(), Some(1));
    assert!(cursor.description().is_none());

    let requests = server.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("POST /db/execute?transaction"));
    assert!(requests[0].contains(r#"["insert into t(name) values (?)","foo"]"#));
}

#[tokio::test]
async fn select_rowcount_and_fetch_idempotence() {
    let server = MockServer::start(vec![Reply::Json(two_row_select_envelope())]).await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    cursor
        .execute("select id, name from t", None)
        .await
        .expect("execute");

    // Rowcount reflects the fully materialized result set.
    assert_eq!(cursor.rowcount(), 2);
    let rows = cursor.fetchall();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("name"), Some(&SqlValue::Text("fiona".into())));
    assert_eq!(rows[1].get("id"), Some(&SqlValue::Int(2)));
    // A second fetchall returns nothing further.
    assert!(cursor.fetchall().is_empty());

    let requests = server.requests().await;
    assert!(requests[0].starts_with("GET /db/query?q=select"));
}

#[tokio::test]
async fn fetchone_and_fetchmany_walk_the_result_set() {
    let server = MockServer::start(vec![Reply::Json(two_row_select_envelope())]).await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    cursor
        .execute("select id, name from t", None)
        .await
        .expect("execute");

    let first = cursor.fetchone().expect("first row");
    assert_eq!(first.get("id"), Some(&SqlValue::Int(1)));
    // Default arraysize is 1.
    let batch = cursor.fetchmany(None);
    assert_eq!(batch.len(), 1);
    assert!(cursor.fetchone().is_none());
}

#[tokio::test]
async fn duplicate_join_columns_survive_decoding() {
    let envelope = r#"{"results":[{"columns":["id","name","id"],"types":["integer","text","integer"],"values":[[1,"fiona",7]]}]}"#;
    let server = MockServer::start(vec![Reply::Json(envelope.to_string())]).await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    cursor
        .execute("select a.id, a.name, b.id from a join b on a.x = b.x", None)
        .await
        .expect("execute");

    let rows = cursor.fetchall();
    assert_eq!(rows[0].get_by_index(0), Some(&SqlValue::Int(1)));
    assert_eq!(rows[0].get_by_index(2), Some(&SqlValue::Int(7)));
    assert_eq!(rows[0].get("id"), Some(&SqlValue::Int(1)));
}

#[tokio::test]
async fn update_reports_rows_affected() {
    let envelope = r#"{"results":[{"rows_affected":2}]}"#;
    let server = MockServer::start(vec![Reply::Json(envelope.to_string())]).await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    cursor
        .execute("UPDATE t SET name='bar'", None)
        .await
        .expect("execute");
    assert_eq!(cursor.rowcount(), 2);

    let requests = server.requests().await;
    assert!(requests[0].starts_with("POST /db/execute?transaction"));
}

#[tokio::test]
async fn write_follows_leader_redirect_to_another_node() {
    let leader = MockServer::start(vec![
        Reply::Json(insert_envelope()),
        Reply::Json(insert_envelope()),
    ])
    .await;
    let follower = MockServer::start(vec![Reply::Redirect(format!(
        "http://127.0.0.1:{}/db/execute?transaction",
        leader.port()
    ))])
    .await;

    let conn = connect(&follower);
    let mut cursor = conn.cursor();
    cursor
        .execute(
            "insert into t(name) values (?)",
            Some(vec![SqlValue::Text("foo".into())].into()),
        )
        .await
        .expect("execute after redirect");
    assert_eq!(cursor.rowcount(), 1);
    assert_eq!(cursor.lastrowid(), Some(1));

    // The follower saw one request; the resend landed on the leader.
    assert_eq!(follower.requests().await.len(), 1);
    assert_eq!(leader.requests().await.len(), 1);

    // The connection now points at the leader: no further follower traffic.
    cursor
        .execute(
            "insert into t(name) values (?)",
            Some(vec![SqlValue::Text("bar".into())].into()),
        )
        .await
        .expect("execute against new leader");
    assert_eq!(follower.requests().await.len(), 1);
    assert_eq!(leader.requests().await.len(), 2);
}

#[tokio::test]
async fn transient_connection_drop_is_retried() {
    let server = MockServer::start(vec![
        Reply::DropConn,
        Reply::Json(two_row_select_envelope()),
    ])
    .await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    cursor
        .execute("select id, name from t", None)
        .await
        .expect("execute after retry");
    assert_eq!(cursor.rowcount(), 2);
    assert_eq!(server.requests().await.len(), 2);
}

#[tokio::test]
async fn remote_statement_error_raises_database_error() {
    let envelope = r#"{"results":[{"error":"near \"bogus\": syntax error"}]}"#;
    let server = MockServer::start(vec![Reply::Json(envelope.to_string())]).await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    let err = cursor
        .execute("bogus statement", None)
        .await
        .expect_err("should fail");
    match err {
        RqliteDbError::DatabaseError(detail) => assert!(detail.contains("syntax error")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn executemany_batches_into_one_request() {
    let envelope = r#"{"results":[{"rows_affected":1},{"rows_affected":1},{"rows_affected":1}]}"#;
    let server = MockServer::start(vec![Reply::Json(envelope.to_string())]).await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    cursor
        .executemany(
            "insert into t(name) values (?)",
            vec![
                Params::Positional(vec![SqlValue::Int(1)]),
                Params::Positional(vec![SqlValue::Int(2)]),
                Params::Positional(vec![SqlValue::Int(3)]),
            ],
        )
        .await
        .expect("executemany");
    assert_eq!(cursor.rowcount(), 3);

    let requests = server.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].contains(r#"["insert into t(name) values (?)",1]"#));
    assert!(requests[0].contains(r#"["insert into t(name) values (?)",3]"#));
}

#[tokio::test]
async fn executemany_binding_failure_sends_nothing() {
    let server = MockServer::start(vec![]).await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    let err = cursor
        .executemany(
            "insert into t(name) values (?)",
            vec![
                Params::Positional(vec![SqlValue::Int(1)]),
                Params::Positional(vec![]),
            ],
        )
        .await
        .expect_err("arity failure");
    assert!(matches!(err, RqliteDbError::ProgrammingError(_)));
    assert!(server.requests().await.is_empty());
}

#[tokio::test]
async fn named_parameters_post_to_the_query_endpoint() {
    let server = MockServer::start(vec![Reply::Json(two_row_select_envelope())]).await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    let params: std::collections::HashMap<String, SqlValue> =
        [("name".to_string(), SqlValue::Text("fiona".into()))].into();
    cursor
        .execute("select id, name from t where name = :name", Some(params.into()))
        .await
        .expect("execute");

    let requests = server.requests().await;
    assert!(requests[0].starts_with("POST /db/query"));
    assert!(requests[0].contains(r#"{"name":"fiona"}"#));
}

#[tokio::test]
async fn consistency_and_write_flags_pass_through() {
    let server = MockServer::start(vec![
        Reply::Json(two_row_select_envelope()),
        Reply::Json(insert_envelope()),
    ])
    .await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();

    cursor
        .execute_with(
            "select id, name from t",
            None,
            ExecuteOptions::default().with_consistency(ReadConsistency::Strong),
        )
        .await
        .expect("select");
    cursor
        .execute_with(
            "insert into t(name) values ('x')",
            None,
            ExecuteOptions::default().with_queue(true).with_wait(true),
        )
        .await
        .expect("insert");

    let requests = server.requests().await;
    assert!(requests[0].contains("level=strong"));
    assert!(requests[1].contains("transaction"));
    assert!(requests[1].contains("queue"));
    assert!(requests[1].contains("wait"));
}

#[tokio::test]
async fn typeless_select_columns_recover_decltypes_from_the_schema_cache() {
    let select_envelope =
        r#"{"results":[{"columns":["d"],"types":[""],"values":[["2004-02-14"]]}]}"#;
    let table_info_envelope = r#"{"results":[{"columns":["cid","name","type","notnull","dflt_value","pk"],"types":["integer","text","text","integer","","integer"],"values":[[0,"d","DATE",0,null,0]]}]}"#;
    let server = MockServer::start(vec![
        Reply::Json(select_envelope.to_string()),
        Reply::Json(table_info_envelope.to_string()),
        Reply::Json(select_envelope.to_string()),
    ])
    .await;

    let conn = ConnectOptions::new(server.host(), server.port())
        .with_parse_decltypes(true)
        .with_private_registry(true)
        .connect()
        .expect("connect");
    let mut cursor = conn.cursor();
    cursor
        .execute("select max(d) as d from t", None)
        .await
        .expect("execute");

    let rows = cursor.fetchall();
    let expected = chrono::NaiveDate::from_ymd_opt(2004, 2, 14).expect("date");
    assert_eq!(rows[0].get("d"), Some(&SqlValue::Date(expected)));
    let description = cursor.description().expect("description");
    assert_eq!(description[0].name, "d");
    assert_eq!(description[0].decl_type.as_deref(), Some("DATE"));

    // The schema fetch happened once; a repeat query hits the cache.
    cursor
        .execute("select max(d) as d from t", None)
        .await
        .expect("execute again");
    let requests = server.requests().await;
    assert_eq!(requests.len(), 3);
    assert!(requests[1].contains("PRAGMA"));
}

#[tokio::test]
async fn closed_connection_refuses_work() {
    let server = MockServer::start(vec![]).await;
    let conn = connect(&server);
    let mut cursor = conn.cursor();
    conn.close();
    let err = cursor
        .execute("select 1", None)
        .await
        .expect_err("closed connection");
    assert!(matches!(err, RqliteDbError::OperationalError(_)));

    let err = cursor.setinputsizes(&[1]).expect_err("not supported");
    assert!(matches!(err, RqliteDbError::NotSupported(_)));
}

#[tokio::test]
async fn colname_hints_convert_and_strip_descriptions() {
    let envelope = r#"{"results":[{"columns":["d [date]"],"types":[""],"values":[["2004-02-14"]]}]}"#;
    // The schema reports a TEXT declared type; the bracketed hint outranks it.
    let table_info_envelope = r#"{"results":[{"columns":["cid","name","type","notnull","dflt_value","pk"],"types":["integer","text","text","integer","","integer"],"values":[[0,"d","TEXT",0,null,0]]}]}"#;
    let server = MockServer::start(vec![
        Reply::Json(envelope.to_string()),
        Reply::Json(table_info_envelope.to_string()),
    ])
    .await;
    let conn = ConnectOptions::new(server.host(), server.port())
        .with_parse_colnames(true)
        .with_private_registry(true)
        .connect()
        .expect("connect");
    let mut cursor = conn.cursor();
    cursor
        .execute("select d as \"d [date]\" from t", None)
        .await
        .expect("execute");

    let expected = chrono::NaiveDate::from_ymd_opt(2004, 2, 14).expect("date");
    let rows = cursor.fetchall();
    assert_eq!(rows[0].get("d"), Some(&SqlValue::Date(expected)));
    assert_eq!(cursor.description().expect("description")[0].name, "d");
}
