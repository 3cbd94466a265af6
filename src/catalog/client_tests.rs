//! Tests for the catalog client.

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::error::CatalogError;

/// Helper: a card JSON value with a single holofoil market price.
fn card_json(id: &str, name: &str, market: Option<f64>) -> serde_json::Value {
    let mut card = serde_json::json!({
        "id": id,
        "name": name,
        "images": { "small": format!("https://images.example/{id}.png"), "large": "" },
        "set": { "id": "base1", "name": "Base", "series": "Base" }
    });
    if let Some(market) = market {
        card["tcgplayer"] = serde_json::json!({
            "url": "https://prices.example",
            "prices": { "holofoil": { "market": market } }
        });
    }
    card
}

fn page_json(cards: Vec<serde_json::Value>) -> serde_json::Value {
    let count = cards.len();
    serde_json::json!({
        "data": cards,
        "page": 1,
        "pageSize": 100,
        "count": count,
        "totalCount": count
    })
}

// ── search_cards ─────────────────────────────────────────────────────

#[tokio::test]
async fn search_sends_name_prefix_query_and_page_size() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .and(query_param("q", "name:\"charizard*\""))
        .and(query_param("pageSize", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![
            card_json("base1-4", "Charizard", Some(365.12)),
            card_json("xy12-11", "Charizard", Some(4.0)),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());
    let cards = client.search_cards("charizard").await.unwrap();

    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].id, "base1-4");
    assert_eq!(cards[0].set.name, "Base");
}

#[tokio::test]
async fn blank_query_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());

    assert!(client.search_cards("").await.unwrap().is_empty());
    assert!(client.search_cards("   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn search_sends_api_key_header_when_configured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .and(header("X-Api-Key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri()).with_api_key("secret-key");

    assert!(client.search_cards("mew").await.unwrap().is_empty());
}

#[tokio::test]
async fn search_429_is_rate_limited_with_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());
    let err = client.search_cards("pikachu").await.unwrap_err();

    assert!(err.is_rate_limited());
    match err {
        CatalogError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(30)));
        }
        other => panic!("Expected CatalogError::RateLimited, got: {other:?}"),
    }
}

#[tokio::test]
async fn search_500_returns_http_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());
    let err = client.search_cards("pikachu").await.unwrap_err();

    assert!(!err.is_rate_limited());
    match err {
        CatalogError::HttpStatus(status) => assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR),
        other => panic!("Expected CatalogError::HttpStatus(500), got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());

    assert!(matches!(
        client.search_cards("pikachu").await,
        Err(CatalogError::Parse(_))
    ));
}

// ── sort / select hazard ─────────────────────────────────────────────

#[tokio::test]
async fn sort_and_select_are_never_combined() {
    let mock_server = MockServer::start().await;

    // Any request carrying orderBy would be a malformed combination
    Mock::given(method("GET"))
        .and(path("/cards"))
        .and(query_param("orderBy", ORDER_BY_MARKET_DESC))
        .respond_with(ResponseTemplate::new(400))
        .with_priority(1)
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .and(query_param("select", "id,name,tcgplayer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![
            card_json("a", "Charizard", Some(10.0)),
            card_json("b", "Charizard", Some(300.0)),
            card_json("c", "Charizard", None),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());
    let options = SearchOptions {
        sort: Some(SortOrder::MarketPriceDesc),
        select: Some(vec!["tcgplayer".to_string(), "id".to_string()]),
    };
    let cards = client.search_cards_with("charizard", &options).await.unwrap();

    let ids: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

#[tokio::test]
async fn rejected_server_sort_falls_back_to_client_sort() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .and(query_param("orderBy", ORDER_BY_MARKET_DESC))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![
            card_json("cheap", "Ninetales", Some(2.0)),
            card_json("rich", "Ninetales", Some(80.0)),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri()).with_options(SearchOptions {
        sort: Some(SortOrder::MarketPriceDesc),
        select: None,
    });
    let cards = client.search_cards("ninetales").await.unwrap();

    assert_eq!(cards[0].id, "rich");
    assert_eq!(cards[1].id, "cheap");
}

#[tokio::test]
async fn timed_out_server_sort_falls_back_to_plain_search() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .and(query_param("orderBy", ORDER_BY_MARKET_DESC))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(vec![card_json("slow", "Mewtwo", Some(9.0))]))
                .set_delay(Duration::from_secs(3)),
        )
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![card_json(
            "base1-10",
            "Mewtwo",
            Some(12.0),
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config {
        api_url: mock_server.uri(),
        request_timeout: Duration::from_millis(300),
        ..Config::default()
    };
    let client = CatalogClient::new(&config).unwrap().with_options(SearchOptions {
        sort: Some(SortOrder::MarketPriceDesc),
        select: None,
    });

    let cards = client.search_cards("mewtwo").await.unwrap();

    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].id, "base1-10");
}

#[tokio::test]
async fn server_error_on_sort_falls_back_to_plain_search() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .and(query_param("orderBy", ORDER_BY_MARKET_DESC))
        .respond_with(ResponseTemplate::new(504))
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![
            card_json("cheap", "Gengar", Some(3.5)),
            card_json("rich", "Gengar", Some(45.0)),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());
    let options = SearchOptions {
        sort: Some(SortOrder::MarketPriceDesc),
        select: None,
    };

    let cards = client.search_cards_with("gengar", &options).await.unwrap();

    let ids: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["rich", "cheap"]);
}

#[tokio::test]
async fn server_error_without_sort_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());
    let err = client.search_cards("gengar").await.unwrap_err();

    match err {
        CatalogError::HttpStatus(status) => assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE),
        other => panic!("Expected CatalogError::HttpStatus(503), got: {other:?}"),
    }
}

#[tokio::test]
async fn truncated_page_still_returns_its_cards() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [card_json("swsh1-1", "Pikachu", Some(6.0))],
            "page": 1,
            "pageSize": 1,
            "count": 1,
            "totalCount": 250
        })))
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri()).with_page_size(1);
    let cards = client.search_cards("pikachu").await.unwrap();

    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].id, "swsh1-1");
}

#[tokio::test]
async fn rate_limit_during_server_sort_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());
    let options = SearchOptions {
        sort: Some(SortOrder::MarketPriceDesc),
        select: None,
    };

    let err = client.search_cards_with("eevee", &options).await.unwrap_err();
    assert!(err.is_rate_limited());
}

// ── get_card ─────────────────────────────────────────────────────────

#[tokio::test]
async fn get_card_unwraps_data_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards/base1-4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": card_json("base1-4", "Charizard", Some(365.12))
        })))
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());
    let card = client.get_card("base1-4").await.unwrap();

    assert_eq!(card.name, "Charizard");
    assert_eq!(crate::price::market_price(&card), Some(365.12));
}

#[tokio::test]
async fn get_card_404_returns_http_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards/nope-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(&mock_server.uri());

    match client.get_card("nope-1").await {
        Err(CatalogError::HttpStatus(status)) => assert_eq!(status, StatusCode::NOT_FOUND),
        other => panic!("Expected CatalogError::HttpStatus(404), got: {other:?}"),
    }
}

// ── helpers ──────────────────────────────────────────────────────────

#[test]
fn name_prefix_query_strips_quotes_and_wildcards() {
    assert_eq!(
        name_prefix_query("  Ninetales-alola "),
        Some("name:\"Ninetales-alola*\"".to_string())
    );
    assert_eq!(
        name_prefix_query("mr. \"mime\"*"),
        Some("name:\"mr. mime*\"".to_string())
    );
    assert_eq!(name_prefix_query("\"*\""), None);
    assert_eq!(name_prefix_query(""), None);
}

#[test]
fn select_fields_always_includes_id_and_name() {
    assert_eq!(select_fields(&[]), "id,name");
    assert_eq!(
        select_fields(&["set".to_string(), "name".to_string(), " images ".to_string()]),
        "id,name,set,images"
    );
}

#[test]
fn page_size_is_clamped_to_catalog_limit() {
    let client = CatalogClient::with_base_url("http://localhost/").with_page_size(500);
    assert_eq!(client.page_size(), 100);
    assert_eq!(client.base_url(), "http://localhost");
}

#[test]
fn client_from_config_uses_configured_values() {
    let config = Config {
        api_url: "https://catalog.example/v2/".to_string(),
        api_key: Some("k".to_string()),
        page_size: 25,
        ..Config::default()
    };

    let client = CatalogClient::new(&config).unwrap();

    assert_eq!(client.base_url(), "https://catalog.example/v2");
    assert_eq!(client.page_size(), 25);
}
