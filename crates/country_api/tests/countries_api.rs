use country_api::{build_router, ApiConfig, ErrorResponse, HealthResponse, MessageResponse};
use country_core::{Country, CountryStatistics};
use serde_json::json;
use tempfile::TempDir;

struct TestServer {
    base: String,
    client: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn create(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/v1/countries"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }
}

/// Spin up the HTTP server on an OS-assigned port backed by a fresh database.
async fn spawn_test_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let config = ApiConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: dir.path().join("countries.db"),
        ..ApiConfig::default()
    };

    let app = build_router(&config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        client: reqwest::Client::new(),
        _dir: dir,
    }
}

async fn seed_nepal_and_egypt(server: &TestServer) -> (Country, Country) {
    let nepal: Country = server
        .create(json!({
            "name": "Nepal",
            "capital": "Kathmandu",
            "population": 29609623,
            "region": "Asia"
        }))
        .await
        .json()
        .await
        .unwrap();
    let egypt: Country = server
        .create(json!({
            "name": "Egypt",
            "capital": "Cairo",
            "population": 104258327,
            "region": "Africa"
        }))
        .await
        .json()
        .await
        .unwrap();
    (nepal, egypt)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let server = spawn_test_server().await;
    let resp = server.get("/health").await;
    assert_eq!(resp.status(), 200);

    let body: HealthResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "ok");
    assert_eq!(body.version, country_core::core_version());
}

#[tokio::test]
async fn create_then_get_by_id_and_name() {
    let server = spawn_test_server().await;
    let (nepal, _) = seed_nepal_and_egypt(&server).await;
    assert!(nepal.id > 0);
    assert!(nepal.is_independent);

    let resp = server.get(&format!("/api/v1/countries/{}", nepal.id)).await;
    assert_eq!(resp.status(), 200);
    let by_id: Country = resp.json().await.unwrap();
    assert_eq!(by_id, nepal);

    let resp = server.get("/api/v1/countries/name/Nepal").await;
    assert_eq!(resp.status(), 200);
    let by_name: Country = resp.json().await.unwrap();
    assert_eq!(by_name, nepal);
}

#[tokio::test]
async fn duplicate_create_is_rejected_with_400() {
    let server = spawn_test_server().await;
    let first = server.create(json!({ "name": "Nepal" })).await;
    assert_eq!(first.status(), 200);

    let second = server.create(json!({ "name": "Nepal" })).await;
    assert_eq!(second.status(), 400);
    let body: ErrorResponse = second.json().await.unwrap();
    assert_eq!(body.detail, "Country already exists");
}

#[tokio::test]
async fn invalid_create_payload_is_rejected_with_422() {
    let server = spawn_test_server().await;

    let negative = server
        .create(json!({ "name": "Negativia", "population": -1 }))
        .await;
    assert_eq!(negative.status(), 422);

    let missing_name = server.create(json!({ "capital": "Nowhere" })).await;
    assert_eq!(missing_name.status(), 422);
}

#[tokio::test]
async fn missing_country_returns_404() {
    let server = spawn_test_server().await;

    let resp = server.get("/api/v1/countries/999").await;
    assert_eq!(resp.status(), 404);
    let body: ErrorResponse = resp.json().await.unwrap();
    assert_eq!(body.detail, "Country not found");

    assert_eq!(server.get("/api/v1/countries/name/Atlantis").await.status(), 404);

    let put = server
        .client
        .put(server.url("/api/v1/countries/999"))
        .json(&json!({ "capital": "X" }))
        .send()
        .await
        .unwrap();
    assert_eq!(put.status(), 404);

    let delete = server
        .client
        .delete(server.url("/api/v1/countries/999"))
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status(), 404);
}

#[tokio::test]
async fn update_applies_only_supplied_fields() {
    let server = spawn_test_server().await;
    let (nepal, _) = seed_nepal_and_egypt(&server).await;

    let resp = server
        .client
        .put(server.url(&format!("/api/v1/countries/{}", nepal.id)))
        .json(&json!({ "capital": "Pokhara", "region": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let updated: Country = resp.json().await.unwrap();
    assert_eq!(updated.capital.as_deref(), Some("Pokhara"));
    assert_eq!(updated.region, None);
    assert_eq!(updated.population, Some(29_609_623));
    assert_eq!(updated.name, "Nepal");
}

#[tokio::test]
async fn delete_removes_country() {
    let server = spawn_test_server().await;
    let (nepal, _) = seed_nepal_and_egypt(&server).await;
    let path = format!("/api/v1/countries/{}", nepal.id);

    let resp = server.client.delete(server.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: MessageResponse = resp.json().await.unwrap();
    assert_eq!(body.message, "Country deleted successfully");

    assert_eq!(server.get(&path).await.status(), 404);
}

#[tokio::test]
async fn search_by_region_and_zero_population_bounds() {
    let server = spawn_test_server().await;
    seed_nepal_and_egypt(&server).await;
    server
        .create(json!({ "name": "Emptyland", "population": 0, "region": "Asia" }))
        .await;

    let asia: Vec<Country> = server
        .get("/api/v1/countries/search?region=Asia&min_population=1")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(asia.len(), 1);
    assert_eq!(asia[0].name, "Nepal");

    let zero: Vec<Country> = server
        .get("/api/v1/countries/search?min_population=0&max_population=0")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(zero.len(), 1);
    assert_eq!(zero[0].name, "Emptyland");

    let by_name: Vec<Country> = server
        .get("/api/v1/countries/search?name=EGY")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name, "Egypt");
}

#[tokio::test]
async fn search_without_criteria_matches_list() {
    let server = spawn_test_server().await;
    seed_nepal_and_egypt(&server).await;

    let listed: Vec<Country> = server
        .get("/api/v1/countries?skip=1&limit=1")
        .await
        .json()
        .await
        .unwrap();
    let searched: Vec<Country> = server
        .get("/api/v1/countries/search?skip=1&limit=1")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed, searched);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Egypt");
}

#[tokio::test]
async fn out_of_range_pagination_is_rejected() {
    let server = spawn_test_server().await;

    for query in ["limit=0", "limit=1001", "skip=-1", "limit=abc"] {
        let resp = server.get(&format!("/api/v1/countries?{query}")).await;
        assert_eq!(resp.status(), 422, "query `{query}`");
    }

    let resp = server
        .get("/api/v1/countries/search?min_population=-5")
        .await;
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn region_listing_and_statistics() {
    let server = spawn_test_server().await;
    seed_nepal_and_egypt(&server).await;

    let asia: Vec<Country> = server
        .get("/api/v1/countries/region/Asia")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(asia.len(), 1);
    assert_eq!(asia[0].name, "Nepal");

    let resp = server.get("/api/v1/countries/stats/overview").await;
    assert_eq!(resp.status(), 200);
    let stats: CountryStatistics = resp.json().await.unwrap();
    assert_eq!(stats.total_countries, 2);
    assert_eq!(stats.total_population, 133_867_950);
    assert_eq!(stats.average_population, 66_933_975.0);
    assert_eq!(stats.regions, ["Africa", "Asia"]);
}

#[tokio::test]
async fn statistics_on_empty_store() {
    let server = spawn_test_server().await;

    let stats: CountryStatistics = server
        .get("/api/v1/countries/stats/overview")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stats.total_countries, 0);
    assert_eq!(stats.average_population, 0.0);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let server = spawn_test_server().await;
    let resp = server.get("/api/v1/nonexistent").await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn region_search_does_not_trim_values() {
    let server = spawn_test_server().await;
    seed_nepal_and_egypt(&server).await;

    let padded: Vec<Country> = server
        .get("/api/v1/countries/search?region=Asia%20")
        .await
        .json()
        .await
        .unwrap();
    assert!(padded.is_empty());

    let blank: Vec<Country> = server
        .get("/api/v1/countries/search?region=%20%20")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(blank.len(), 2);
}

#[tokio::test]
async fn oversized_population_is_rejected_and_statistics_stay_available() {
    let server = spawn_test_server().await;
    seed_nepal_and_egypt(&server).await;

    let resp = server
        .create(json!({ "name": "Overflowia", "population": i64::MAX }))
        .await;
    assert_eq!(resp.status(), 422);
    let body: ErrorResponse = resp.json().await.unwrap();
    assert!(body.detail.contains("population"), "{}", body.detail);

    let resp = server.get("/api/v1/countries/stats/overview").await;
    assert_eq!(resp.status(), 200);
    let stats: CountryStatistics = resp.json().await.unwrap();
    assert_eq!(stats.total_countries, 2);
    assert_eq!(stats.total_population, 133_867_950);
}
