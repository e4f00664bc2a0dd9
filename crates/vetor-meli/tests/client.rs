//! Integration tests for the marketplace client, token manager, and offer
//! service using wiremock HTTP mocks.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_string_contains, header, method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vetor_core::{AffiliateCatalog, AffiliateEntry, AppConfig, AuthMode, BatchMode, Environment};
use vetor_meli::{Credentials, MeliClient, OfferService, TokenManager};

fn test_config(batch_mode: BatchMode, auth_mode: AuthMode) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("addr"),
        log_level: "info".to_string(),
        catalog_path: "./config/products.yaml".into(),
        meli_app_id: None,
        meli_app_secret: None,
        meli_refresh_token: None,
        meli_affiliate_id: None,
        webhook_secret: None,
        batch_mode,
        auth_mode,
        http_timeout_secs: 5,
        fetch_concurrency: 4,
        cache_ttl_secs: 3600,
        token_safety_margin_secs: 120,
        max_retries: 0,
        retry_backoff_base_ms: 0,
        rate_limit_per_min: 120,
    }
}

fn test_catalog() -> AffiliateCatalog {
    AffiliateCatalog::new(vec![
        AffiliateEntry {
            item_id: "MLB1".to_string(),
            affiliate_link: "https://mercadolivre.com/sec/aaa".to_string(),
            title: Some("Produto Um".to_string()),
            image_url: None,
            category: None,
        },
        AffiliateEntry {
            item_id: "MLB2".to_string(),
            affiliate_link: "https://mercadolivre.com/sec/bbb".to_string(),
            title: None,
            image_url: None,
            category: None,
        },
    ])
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn batch_fetch_drops_non_200_envelopes() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "code": 200,
            "body": {
                "id": "MLB1",
                "title": "Produto Um",
                "price": 100,
                "original_price": 200,
                "thumbnail": "https://http2.mlstatic.com/D_555-I.jpg",
                "permalink": "https://www.mercadolivre.com.br/p/MLB1"
            }
        },
        { "code": 404 }
    ]);

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param_contains("ids", "MLB1,MLB2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let config = test_config(BatchMode::SingleCall, AuthMode::None);
    let client = MeliClient::with_base_url(&config, &server.uri()).expect("client");
    let items = client
        .fetch_items(&ids(&["MLB1", "MLB2"]))
        .await
        .expect("batch fetch");

    assert_eq!(items.len(), 1, "the 404 envelope must be dropped");
    assert_eq!(items[0].id, "MLB1");
}

#[tokio::test]
async fn batch_failure_degrades_offer_service_to_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = test_config(BatchMode::SingleCall, AuthMode::None);
    let client = MeliClient::with_base_url(&config, &server.uri()).expect("client");
    let service = OfferService::new(client, test_catalog(), None);

    let offers = service.resolve(&ids(&["MLB1", "MLB2", "MLB999"])).await;

    // Only mapped ids survive; every offer carries the unavailable-price sentinel.
    assert_eq!(offers.len(), 2);
    assert!(offers.iter().all(|o| o.price.is_none()));
    assert_eq!(offers[0].affiliate_link, "https://mercadolivre.com/sec/aaa");
    assert_eq!(offers[1].affiliate_link, "https://mercadolivre.com/sec/bbb");
}

#[tokio::test]
async fn normalized_offer_carries_discount_and_upgraded_image() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "code": 200,
            "body": {
                "id": "MLB1",
                "title": "Produto Um",
                "price": 100,
                "original_price": 200,
                "thumbnail": "https://http2.mlstatic.com/D_555-I.jpg",
                "permalink": "https://www.mercadolivre.com.br/p/MLB1"
            }
        },
        { "code": 404 }
    ]);

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let config = test_config(BatchMode::SingleCall, AuthMode::None);
    let client = MeliClient::with_base_url(&config, &server.uri()).expect("client");
    let service = OfferService::new(client, test_catalog(), None);

    let offers = service.resolve(&ids(&["MLB1", "MLB2"])).await;

    assert_eq!(offers.len(), 1, "MLB2 is silently dropped");
    let offer = &offers[0];
    assert_eq!(offer.discount_percent, Some(50));
    assert!(offer.image_url.ends_with("-O.jpg"));
    assert!(!offer.affiliate_link.is_empty());
}

#[tokio::test]
async fn per_item_strategy_is_fail_soft_per_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items/MLB1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "MLB1",
            "title": "Produto Um",
            "price": 249.9,
            "thumbnail": "https://http2.mlstatic.com/D_1-I.jpg",
            "permalink": "https://www.mercadolivre.com.br/p/MLB1"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items/MLB2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(BatchMode::PerItem, AuthMode::None);
    let client = MeliClient::with_base_url(&config, &server.uri()).expect("client");
    let items = client
        .fetch_items(&ids(&["MLB1", "MLB2"]))
        .await
        .expect("per-item fetch never fails as a whole");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "MLB1");
}

#[tokio::test]
async fn per_item_results_keep_request_order() {
    let server = MockServer::start().await;

    for id in ["MLB3", "MLB1", "MLB2"] {
        Mock::given(method("GET"))
            .and(path(format!("/items/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": id,
                "title": format!("Produto {id}"),
                "price": 10,
                "permalink": format!("https://www.mercadolivre.com.br/p/{id}")
            })))
            .mount(&server)
            .await;
    }

    let config = test_config(BatchMode::PerItem, AuthMode::None);
    let client = MeliClient::with_base_url(&config, &server.uri()).expect("client");
    let items = client
        .fetch_items(&ids(&["MLB3", "MLB1", "MLB2"]))
        .await
        .expect("fetch");

    let got: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(got, vec!["MLB3", "MLB1", "MLB2"]);
}

#[tokio::test]
async fn token_is_cached_within_safety_margin() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "APP_USR-token-1",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = TokenManager::new(
        reqwest::Client::new(),
        format!("{}/oauth/token", server.uri()),
        AuthMode::ClientCredentials,
        Some(Credentials {
            client_id: "app-id".to_string(),
            client_secret: "app-secret".to_string(),
            refresh_token: None,
        }),
        Duration::from_secs(60),
    );

    let first = manager.access_token().await;
    let second = manager.access_token().await;

    assert_eq!(first.as_deref(), Some("APP_USR-token-1"));
    assert_eq!(first, second, "second call must return the cached token");
    // wiremock's expect(1) verifies on drop that only one exchange happened.
}

#[tokio::test]
async fn concurrent_cold_callers_share_one_token_exchange() {
    let server = MockServer::start().await;

    // The delayed response keeps the exchange in flight while the other
    // callers arrive, so a second exchange would be observable.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "access_token": "APP_USR-shared",
                    "expires_in": 3600
                }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = Arc::new(TokenManager::new(
        reqwest::Client::new(),
        format!("{}/oauth/token", server.uri()),
        AuthMode::ClientCredentials,
        Some(Credentials {
            client_id: "app-id".to_string(),
            client_secret: "app-secret".to_string(),
            refresh_token: None,
        }),
        Duration::from_secs(60),
    ));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.access_token().await })
        })
        .collect();

    for task in tasks {
        let token = task.await.expect("task join");
        assert_eq!(token.as_deref(), Some("APP_USR-shared"));
    }
    // wiremock's expect(1) verifies on drop: eight cold callers, one exchange.
}

#[tokio::test]
async fn refresh_token_grant_sends_refresh_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=TG-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "APP_USR-token-2",
            "expires_in": 21600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = TokenManager::new(
        reqwest::Client::new(),
        format!("{}/oauth/token", server.uri()),
        AuthMode::RefreshToken,
        Some(Credentials {
            client_id: "app-id".to_string(),
            client_secret: "app-secret".to_string(),
            refresh_token: Some("TG-refresh".to_string()),
        }),
        Duration::from_secs(60),
    );

    assert_eq!(
        manager.access_token().await.as_deref(),
        Some("APP_USR-token-2")
    );
}

#[tokio::test]
async fn failed_token_exchange_yields_none_and_fetch_proceeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let manager = TokenManager::new(
        reqwest::Client::new(),
        format!("{}/oauth/token", server.uri()),
        AuthMode::ClientCredentials,
        Some(Credentials {
            client_id: "app-id".to_string(),
            client_secret: "wrong".to_string(),
            refresh_token: None,
        }),
        Duration::from_secs(60),
    );

    assert!(manager.access_token().await.is_none());
}

#[tokio::test]
async fn no_credentials_mean_no_token_call_and_unauthenticated_fetch() {
    let server = MockServer::start().await;

    // Zero token-endpoint calls allowed.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "code": 200,
                "body": {
                    "id": "MLB1",
                    "title": "Produto Um",
                    "price": 50,
                    "permalink": "https://www.mercadolivre.com.br/p/MLB1"
                }
            }
        ])))
        .mount(&server)
        .await;

    // client-credentials mode configured but secrets absent.
    let config = test_config(BatchMode::SingleCall, AuthMode::ClientCredentials);
    let client = MeliClient::with_base_url(&config, &server.uri()).expect("client");
    let items = client.fetch_items(&ids(&["MLB1"])).await.expect("fetch");

    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn bearer_token_is_attached_when_available() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "APP_USR-bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(header("authorization", "Bearer APP_USR-bearer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "code": 200,
                "body": {
                    "id": "MLB1",
                    "title": "Produto Um",
                    "price": 50,
                    "permalink": "https://www.mercadolivre.com.br/p/MLB1"
                }
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(BatchMode::SingleCall, AuthMode::ClientCredentials);
    config.meli_app_id = Some("app-id".to_string());
    config.meli_app_secret = Some("app-secret".to_string());

    let client = MeliClient::with_base_url(&config, &server.uri()).expect("client");
    let items = client.fetch_items(&ids(&["MLB1"])).await.expect("fetch");
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn empty_live_result_degrades_to_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let config = test_config(BatchMode::SingleCall, AuthMode::None);
    let client = MeliClient::with_base_url(&config, &server.uri()).expect("client");
    let service = OfferService::new(client, test_catalog(), None);

    let offers = service.resolve(&ids(&["MLB1"])).await;
    assert_eq!(offers.len(), 1);
    assert!(offers[0].price.is_none());
    assert_eq!(offers[0].title, "Produto Um");
}

#[tokio::test]
async fn resolve_output_never_exceeds_requested_ids() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items/MLB1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "MLB1",
            "title": "Produto Um",
            "price": 75,
            "permalink": "https://www.mercadolivre.com.br/p/MLB1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items/MLB2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = test_config(BatchMode::PerItem, AuthMode::None);
    let client = MeliClient::with_base_url(&config, &server.uri()).expect("client");
    let service = OfferService::new(client, test_catalog(), Some("vetor-tool".to_string()));

    let requested = ids(&["MLB1", "MLB2"]);
    let offers = service.resolve(&requested).await;

    assert!(offers.len() <= requested.len());
    assert!(offers.iter().all(|o| !o.affiliate_link.is_empty()));
}
