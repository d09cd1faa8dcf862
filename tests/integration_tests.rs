// Integration tests for Coffind Algo
//
// The annotation pipeline is driven end-to-end against a local mock of the
// chat-completion endpoint. Backoff and stagger intervals are shrunk to
// milliseconds so the retry envelope runs in test time.

use coffind_algo::catalog::Catalog;
use coffind_algo::core::rank;
use coffind_algo::models::UserPreferences;
use coffind_algo::services::{AnnotationClient, AnnotationConfig, AnnotationScheduler};
use std::sync::Arc;
use std::time::Duration;

fn create_test_config(endpoint: String) -> AnnotationConfig {
    AnnotationConfig {
        endpoint,
        api_key: "test_key".to_string(),
        max_attempts: 3,
        rate_limit_backoff: Duration::from_millis(10),
        transport_backoff: Duration::from_millis(5),
        request_timeout: Duration::from_secs(5),
        ..AnnotationConfig::default()
    }
}

fn create_preferences(must: &[&str], nice: &[&str]) -> UserPreferences {
    UserPreferences {
        location: "忠孝敦化".to_string(),
        must_have_tags: must.iter().map(|t| t.to_string()).collect(),
        nice_to_have_tags: nice.iter().map(|t| t.to_string()).collect(),
    }
}

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "choices": [
            { "message": { "role": "assistant", "content": content } }
        ]
    })
    .to_string()
}

const VALID_REPLY: &str = "{\"recommendation\":\"推薦理由：插座多又不限時，距離極近。\",\"atmosphere\":\"AI 氛圍快照：木質桌面與低語交談聲。\",\"actionGuide\":\"行為引導：要查看菜單嗎？\"}";

#[tokio::test]
async fn test_annotate_parses_clean_json_reply() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer test_key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(VALID_REPLY))
        .expect(1)
        .create_async()
        .await;

    let client = AnnotationClient::new(create_test_config(server.url()));
    let preferences = create_preferences(&["插座多"], &["不限時"]);
    let results = rank(&Catalog::seed(), &preferences);

    let annotation = client.annotate(&results[0], &preferences).await;

    mock.assert_async().await;
    assert!(annotation.recommendation.contains("距離極近"));
    assert!(annotation.is_complete());
}

#[tokio::test]
async fn test_annotate_strips_markdown_fences() {
    let fenced = format!("```json\n{}\n```", VALID_REPLY);
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(&fenced))
        .expect(1)
        .create_async()
        .await;

    let client = AnnotationClient::new(create_test_config(server.url()));
    let preferences = create_preferences(&["插座多"], &[]);
    let results = rank(&Catalog::seed(), &preferences);

    let annotation = client.annotate(&results[0], &preferences).await;

    mock.assert_async().await;
    assert_eq!(
        annotation.atmosphere,
        "AI 氛圍快照：木質桌面與低語交談聲。"
    );
}

#[tokio::test]
async fn test_rate_limit_exhaustion_returns_offline_fallback() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_body("rate limited")
        .expect(3)
        .create_async()
        .await;

    let client = AnnotationClient::new(create_test_config(server.url()));
    let preferences = create_preferences(&["插座多"], &[]);
    let results = rank(&Catalog::seed(), &preferences);

    let annotation = client.annotate(&results[0], &preferences).await;

    // All three attempts consumed, then the fixed offline text
    mock.assert_async().await;
    assert!(annotation.recommendation.contains("無法連線至 AI 引擎"));
    assert_eq!(annotation.atmosphere, "AI 氛圍快照：(離線模式)");
}

#[tokio::test]
async fn test_server_errors_retry_then_offline_fallback() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_body("boom")
        .expect(3)
        .create_async()
        .await;

    let client = AnnotationClient::new(create_test_config(server.url()));
    let preferences = create_preferences(&["插座多"], &[]);
    let results = rank(&Catalog::seed(), &preferences);

    let annotation = client.annotate(&results[0], &preferences).await;

    mock.assert_async().await;
    assert!(annotation.is_complete());
    assert!(annotation.recommendation.contains("無法連線"));
}

#[tokio::test]
async fn test_unparseable_reply_falls_back_without_retrying() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("抱歉，我今天不想輸出 JSON。"))
        .expect(1)
        .create_async()
        .await;

    let client = AnnotationClient::new(create_test_config(server.url()));
    let preferences = create_preferences(&["插座多"], &[]);
    let results = rank(&Catalog::seed(), &preferences);
    let top = &results[0];

    let annotation = client.annotate(top, &preferences).await;

    // Parse failure short-circuits: exactly one network attempt
    mock.assert_async().await;
    assert!(annotation
        .recommendation
        .contains(&top.venue.tags_joined()));
    assert_eq!(annotation.atmosphere, "AI 氛圍快照：資料解析中...");
}

#[tokio::test]
async fn test_scheduler_annotates_valid_results_and_skips_hard_misses() {
    let mut server = mockito::Server::new_async().await;
    // Only the three venues carrying the must-have tag get annotated
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(VALID_REPLY))
        .expect(3)
        .create_async()
        .await;

    let client = Arc::new(AnnotationClient::new(create_test_config(server.url())));
    let scheduler = AnnotationScheduler::new(client, Duration::from_millis(5));
    let preferences = create_preferences(&["插座多"], &[]);
    let results = rank(&Catalog::seed(), &preferences);

    let ticket = scheduler.begin_search();
    let annotated = scheduler
        .annotate_ranked(results, &preferences, &ticket)
        .await;

    mock.assert_async().await;
    for result in &annotated {
        if result.is_hard_miss() {
            assert!(result.annotation.is_none());
        } else {
            assert!(result.annotation.is_some());
            assert!(result.annotation.as_ref().unwrap().is_complete());
        }
    }
}

#[tokio::test]
async fn test_stale_generation_discards_resolved_annotations() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(VALID_REPLY))
        .create_async()
        .await;

    let client = Arc::new(AnnotationClient::new(create_test_config(server.url())));
    let scheduler = AnnotationScheduler::new(client, Duration::from_millis(5));
    let preferences = create_preferences(&["插座多"], &[]);
    let results = rank(&Catalog::seed(), &preferences);

    let stale = scheduler.begin_search();
    // A newer search supersedes the first one before its tasks deliver
    let _current = scheduler.begin_search();

    let annotated = scheduler
        .annotate_ranked(results, &preferences, &stale)
        .await;

    for result in &annotated {
        assert!(
            result.annotation.is_none(),
            "stale annotation applied for venue {}",
            result.venue.id
        );
    }
}

#[tokio::test]
async fn test_annotation_survives_missing_content_field() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{\"choices\":[]}")
        .expect(1)
        .create_async()
        .await;

    let client = AnnotationClient::new(create_test_config(server.url()));
    let preferences = create_preferences(&["插座多"], &[]);
    let results = rank(&Catalog::seed(), &preferences);

    let annotation = client.annotate(&results[0], &preferences).await;

    // Empty payload is a parse failure, not a transport failure
    mock.assert_async().await;
    assert!(annotation.is_complete());
    assert_eq!(annotation.atmosphere, "AI 氛圍快照：資料解析中...");
}

#[test]
fn test_end_to_end_ranking_shape() {
    let catalog = Catalog::seed();
    let preferences = create_preferences(&["插座多"], &["Wi-Fi強", "不限時"]);

    let results = rank(&catalog, &preferences);

    assert_eq!(results.len(), catalog.len());
    // Scores are non-increasing down the list
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    // Annotations are absent until the annotation pipeline runs
    assert!(results.iter().all(|r| r.annotation.is_none()));
}
