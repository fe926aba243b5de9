use chrono::NaiveDate;
use notifeed::blocks::ContentBlock;
use notifeed::entry::{BodyKind, NormalizedEntry};
use notifeed::storage::{DocumentStore, NotionStore};
use serde_json::json;

fn sample_entry() -> NormalizedEntry {
    NormalizedEntry {
        title: "Sample".to_string(),
        author: "Jane Doe".to_string(),
        tag: "tech".to_string(),
        published_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
        link: url::Url::parse("https://example.com/sample").unwrap(),
        body_html: "<p>Body</p>".to_string(),
        body_kind: BodyKind::FullArticle,
    }
}

fn store(server: &mockito::ServerGuard) -> NotionStore {
    NotionStore::new(server.url(), "test-token", 5).expect("build store")
}

#[tokio::test]
async fn find_database_id_returns_first_match() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/v1/search")
        .match_header("authorization", "Bearer test-token")
        .match_header("notion-version", "2022-06-28")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"results": [{"id": "db-123", "object": "database"}], "has_more": false}"#)
        .create_async()
        .await;

    let id = store(&server)
        .find_database_id("Articles")
        .await
        .expect("database id");
    assert_eq!(id, "db-123");

    mock.assert_async().await;
}

#[tokio::test]
async fn find_database_id_fails_on_empty_results() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/v1/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"results": [], "has_more": false}"#)
        .create_async()
        .await;

    let result = store(&server).find_database_id("Articles").await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("no database matched"));
}

#[tokio::test]
async fn title_exists_reflects_query_results() {
    let mut server = mockito::Server::new_async().await;

    let hit = server
        .mock("POST", "/v1/databases/db-123/query")
        .match_body(mockito::Matcher::PartialJson(json!({
            "filter": { "property": "title", "rich_text": { "equals": "Sample" } }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"results": [{"id": "page-1"}], "has_more": false}"#)
        .create_async()
        .await;

    let exists = store(&server)
        .title_exists("db-123", "Sample")
        .await
        .expect("query");
    assert!(exists);
    hit.assert_async().await;

    let _miss = server
        .mock("POST", "/v1/databases/db-123/query")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"results": [], "has_more": false}"#)
        .create_async()
        .await;

    let exists = store(&server)
        .title_exists("db-123", "Other")
        .await
        .expect("query");
    assert!(!exists);
}

#[tokio::test]
async fn create_document_posts_page_with_children() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/v1/pages")
        .match_body(mockito::Matcher::PartialJson(json!({
            "parent": { "database_id": "db-123" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "page-new", "object": "page"}"#)
        .create_async()
        .await;

    let blocks = vec![
        ContentBlock::Heading {
            level: 2,
            text: "Title".to_string(),
        },
        ContentBlock::Paragraph {
            text: "Body".to_string(),
        },
    ];
    store(&server)
        .create_document("db-123", &sample_entry(), &blocks)
        .await
        .expect("create");

    mock.assert_async().await;
}

#[tokio::test]
async fn create_document_surfaces_api_errors() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/v1/pages")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"object": "error", "message": "validation_error"}"#)
        .create_async()
        .await;

    let result = store(&server)
        .create_document("db-123", &sample_entry(), &[])
        .await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("400"));
}

#[tokio::test]
async fn stale_before_follows_pagination() {
    let mut server = mockito::Server::new_async().await;

    // Exact body match: the follow-up request differs by its start_cursor.
    let first_page = server
        .mock("POST", "/v1/databases/db-123/query")
        .match_body(mockito::Matcher::Json(json!({
            "filter": { "property": "Article Date", "date": { "before": "2024-01-01T00:00:00" } }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"results": [{"id": "page-1"}, {"id": "page-2"}], "has_more": true, "next_cursor": "cur-2"}"#,
        )
        .create_async()
        .await;

    let second_page = server
        .mock("POST", "/v1/databases/db-123/query")
        .match_body(mockito::Matcher::PartialJson(json!({ "start_cursor": "cur-2" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"results": [{"id": "page-3"}], "has_more": false}"#)
        .create_async()
        .await;

    let cutoff = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let ids = store(&server)
        .stale_before("db-123", cutoff)
        .await
        .expect("stale query");

    assert_eq!(ids, vec!["page-1", "page-2", "page-3"]);
    first_page.assert_async().await;
    second_page.assert_async().await;
}

#[tokio::test]
async fn archive_patches_the_page() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("PATCH", "/v1/pages/page-1")
        .match_body(mockito::Matcher::PartialJson(json!({ "archived": true })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "page-1", "archived": true}"#)
        .create_async()
        .await;

    store(&server).archive("page-1").await.expect("archive");
    mock.assert_async().await;
}
