//! Round trips against a real server. Every test returns early when `DATABASE_URL` is unset.

use chrono::NaiveDateTime;
use pgstmt::prelude::*;
use serde::Deserialize;
use tokio_postgres::{Client, NoTls};

const SCHEMA: &str = r#"
CREATE TEMP TABLE members (
    id BIGSERIAL PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    nickname TEXT,
    prefs JSONB NOT NULL DEFAULT '{}',
    joined_text TEXT NOT NULL DEFAULT '2024-01-01 09:30:00'
);
"#;

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
struct Prefs {
    #[serde(default)]
    theme: String,
}

#[derive(Debug, Default)]
struct Member {
    id: i64,
    email: String,
    nickname: String,
    prefs: Prefs,
    joined: Option<NaiveDateTime>,
}

#[derive(Clone)]
struct NewMember {
    email: String,
    nickname: Option<String>,
    prefs: serde_json::Value,
}

#[derive(Default)]
struct Search {
    email_like: Option<String>,
    ids: Vec<i64>,
    limit: i64,
}

async fn connect(test: &str) -> StmtResult<Option<Client>> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            return Ok(None);
        }
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls).await?;
    tokio::spawn(async move {
        let _ = connection.await;
    });
    client.batch_execute(SCHEMA).await?;
    Ok(Some(client))
}

fn insert_members() -> Exec<Vec<NewMember>> {
    let row = values(|m: &NewMember| {
        vec![
            Arg::new(m.email.clone()),
            Arg::new(m.nickname.clone()),
            Arg::new(m.prefs.clone()),
        ]
    });
    let sql = "INSERT INTO members (email, nickname, prefs) VALUES ?";
    Exec::new(template::<Vec<NewMember>>(sql).bind(list(",", row))).tag("members.insert")
}

fn search_members() -> Query<Member, Search> {
    let email_like = stmt::<String>("email LIKE ?");
    let in_ids = template::<Vec<i64>>("id IN (?)").bind(list_params(","));
    let filters = where_all([
        optional(|s: &Search| s.email_like.as_ref(), email_like).boxed(),
        optional(|s: &Search| (!s.ids.is_empty()).then_some(&s.ids), in_ids).boxed(),
    ]);
    let sql = "SELECT id, email, nickname, prefs, joined_text FROM members ? ORDER BY id ?";
    let statement = template::<Search>(sql)
        .bind(filters)
        .bind(map(|s: &Search| s.limit, stmt::<i64>("LIMIT ?")));

    Query::new(statement)
        .column("id", scan(|m: &mut Member, v: i64| m.id = v))
        .column("email", scan(|m: &mut Member, v: String| m.email = v))
        .column(
            "nickname",
            scan(|m: &mut Member, v: String| m.nickname = v).nullable("-".to_string()),
        )
        .column("prefs", scan(|m: &mut Member, v: Prefs| m.prefs = v).json())
        .column(
            "joined_text",
            timestamp(
                "%Y-%m-%d %H:%M:%S",
                scan(|m: &mut Member, v: NaiveDateTime| m.joined = Some(v)),
            ),
        )
        .tag("members.search")
}

fn seed() -> Vec<NewMember> {
    vec![
        NewMember {
            email: "ada@example.com".into(),
            nickname: Some("ada".into()),
            prefs: serde_json::json!({ "theme": "dark" }),
        },
        NewMember {
            email: "bob@example.com".into(),
            nickname: None,
            prefs: serde_json::json!({}),
        },
        NewMember {
            email: "cy@example.org".into(),
            nickname: Some("cy".into()),
            prefs: serde_json::json!({ "theme": "light" }),
        },
    ]
}

#[tokio::test]
async fn insert_and_search() -> StmtResult<()> {
    let Some(client) = connect("insert_and_search").await? else {
        return Ok(());
    };

    let inserted = insert_members().result(&client, &seed()).await?;
    assert_eq!(inserted, 3);

    let search = search_members();
    let everyone = Search {
        limit: 10,
        ..Search::default()
    };
    let all = search.all(&client, &everyone).await?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].nickname, "ada");
    assert_eq!(all[0].prefs.theme, "dark");
    assert_eq!(all[1].nickname, "-");
    assert!(all.iter().all(|m| m.joined.is_some()));

    let filter = Search {
        email_like: Some("%.com".into()),
        ids: vec![all[1].id, all[2].id],
        limit: 10,
    };
    let filtered = search.all(&client, &filter).await?;
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].email, "bob@example.com");

    let just_one = Search {
        limit: 1,
        ..Search::default()
    };
    let limited = search.first(&client, &just_one).await?;
    assert_eq!(limited.email, "ada@example.com");

    Ok(())
}

#[tokio::test]
async fn result_shapes() -> StmtResult<()> {
    let Some(client) = connect("result_shapes").await? else {
        return Ok(());
    };
    insert_members().result(&client, &seed()).await?;

    let by_email = search_members();
    let none = Search {
        email_like: Some("nobody@%".into()),
        limit: 10,
        ..Search::default()
    };
    let many = Search {
        limit: 10,
        ..Search::default()
    };

    let err = by_email.one(&client, &none).await.unwrap_err();
    assert!(err.is_no_rows());
    let err = by_email.first(&client, &none).await.unwrap_err();
    assert!(err.is_no_rows());
    let err = by_email.one(&client, &many).await.unwrap_err();
    assert!(err.is_too_many_rows());
    assert!(by_email.all(&client, &none).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn escaped_marker_reaches_the_server() -> StmtResult<()> {
    let Some(client) = connect("escaped_marker_reaches_the_server").await? else {
        return Ok(());
    };
    insert_members().result(&client, &seed()).await?;

    // jsonb `?` operator
    let sql = "SELECT count(*) FROM members WHERE prefs ?? 'theme'";
    let themed = Query::<i64, ()>::scalar(template::<()>(sql));
    assert_eq!(themed.one(&client, &()).await?, 2);

    Ok(())
}

#[tokio::test]
async fn unique_violation_passes_through() -> StmtResult<()> {
    let Some(client) = connect("unique_violation_passes_through").await? else {
        return Ok(());
    };
    insert_members().result(&client, &seed()).await?;

    let err = insert_members()
        .result(&client, &seed()[..1].to_vec())
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(err.sqlstate(), Some("23505"));

    Ok(())
}

#[tokio::test]
async fn transaction_is_a_querier() -> StmtResult<()> {
    let Some(mut client) = connect("transaction_is_a_querier").await? else {
        return Ok(());
    };
    let count = Query::<i64, ()>::scalar(template::<()>("SELECT count(*) FROM members"));

    let tx = client.transaction().await?;
    insert_members().result(&tx, &seed()).await?;
    assert_eq!(count.one(&tx, &()).await?, 3);
    tx.rollback().await?;

    assert_eq!(count.one(&client, &()).await?, 0);
    Ok(())
}

#[tokio::test]
async fn manual_rows_against_server() -> StmtResult<()> {
    let Some(client) = connect("manual_rows_against_server").await? else {
        return Ok(());
    };

    let sql = "SELECT generate_series(1::bigint, ?) AS n";
    let series = Query::<i64, i64>::scalar(stmt::<i64>(sql));
    let mut rows = series.rows(&client, &5).await?;
    assert_eq!(rows.columns(), ["n"]);

    let mut sum = 0;
    while rows.next().await? {
        sum += rows.value()?;
    }
    assert_eq!(sum, 15);
    assert!(rows.is_closed());

    // Abandon a cursor halfway; the connection stays usable.
    let mut rows = series.rows(&client, &100).await?;
    assert!(rows.next().await?);
    drop(rows);
    assert_eq!(series.all(&client, &2).await?, vec![1, 2]);

    Ok(())
}

#[tokio::test]
async fn pooled_client() -> StmtResult<()> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL is not set; skipping pooled_client");
        return Ok(());
    };

    let pool = create_pool_with_config(&database_url, 2)?;
    let client = pool.get().await?;
    let one = Query::<i32, ()>::scalar(template::<()>("SELECT 1"));
    assert_eq!(one.one(&client, &()).await?, 1);

    Ok(())
}
