//! Azure search client against a mock HTTP server.

use std::sync::Arc;

use async_trait::async_trait;
use legal_consultor::error::SearchError;
use legal_consultor::search::{
    AzureSearchClient, CaseQuery, CaseSearch, Embedder, FilterValue, Filters, ProvidenceListQuery,
    ProvidenceQuery, SearchConfig,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const SEARCH_PATH: &str = "/indexes/casos/docs/search";

struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, SearchError> {
        Ok(vec![0.25, 0.5, 0.75])
    }
}

fn client(server: &MockServer) -> AzureSearchClient {
    let config = SearchConfig::builder()
        .endpoint(server.uri())
        .index("casos")
        .api_key("secret")
        .build()
        .unwrap_or_else(|_| unreachable!());
    AzureSearchClient::new(config, Arc::new(FixedEmbedder)).unwrap_or_else(|_| unreachable!())
}

fn body_of(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap_or_default()
}

#[tokio::test]
async fn test_search_cases_request_and_decoding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(query_param("api-version", "2024-07-01"))
        .and(header("api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"@search.score": 2.5, "id": "doc-1", "title": "T-1/2024", "content": "texto", "date": "2024-02-01"},
                {"@search.score": 1.0, "title": "sin id"},
                {"@search.score": -3.0, "id": 7}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let docs = client(&server)
        .search_cases(&CaseQuery {
            query: "despido embarazada".to_string(),
            top_k: 4,
            filters: None,
        })
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "doc-1");
    assert!((docs[0].score - 2.5).abs() < f64::EPSILON);
    assert_eq!(docs[0].title.as_deref(), Some("T-1/2024"));
    assert_eq!(docs[1].id, "7");
    assert!(docs[1].score.abs() < f64::EPSILON);

    let requests = server.received_requests().await.unwrap_or_default();
    let body = body_of(&requests[0]);
    assert_eq!(body["search"], "despido embarazada");
    assert_eq!(body["top"], 4);
    assert_eq!(body["vectorQueries"][0]["vector"], json!([0.25, 0.5, 0.75]));
    assert_eq!(body["queryType"], "semantic");
}

#[tokio::test]
async fn test_empty_filter_map_sends_same_request_as_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .mount(&server)
        .await;

    let search = client(&server);
    for filters in [None, Some(Filters::new())] {
        let query = CaseQuery {
            query: "tutela".to_string(),
            top_k: 6,
            filters,
        };
        search
            .search_cases(&query)
            .await
            .unwrap_or_else(|_| unreachable!());
    }

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body, requests[1].body);
    assert!(body_of(&requests[0]).get("filter").is_none());
}

#[tokio::test]
async fn test_providence_lookup_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_partial_json(json!({
            "search": "*",
            "filter": "title eq 'T-1/2024' and source eq 'O''Brien'",
            "top": 10
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "@search.score": 1.0,
                "id": "doc-1",
                "title": "T-1/2024",
                "year": "2024",
                "relevance": 0.9,
                "temas": ["laboral", "salud"]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut extra = Filters::new();
    extra.insert("source".into(), FilterValue::Text("O'Brien".into()));
    let docs = client(&server)
        .search_by_providence(&ProvidenceQuery {
            providence: "T-1/2024".to_string(),
            top_k: 10,
            additional_filters: Some(extra),
        })
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].year, Some(2024));
    assert_eq!(docs[0].temas, vec!["laboral", "salud"]);
}

#[tokio::test]
async fn test_summary_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_partial_json(json!({"top": 100})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let summary = client(&server)
        .providence_summary("T-404/2024")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!summary.found);
    assert!(summary.error.is_some());
}

#[tokio::test]
async fn test_list_providences_uses_facets_and_samples() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_partial_json(json!({"top": 0, "facets": ["title,count:2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [],
            "@search.facets": {
                "title": [
                    {"value": "T-1/2024", "count": 12},
                    {"value": "C-2/2023", "count": 3}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_partial_json(json!({"top": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"source": "corte", "year": 2024, "relevance": 0.7}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let listings = client(&server)
        .list_providences(&ProvidenceListQuery {
            limit: 2,
            ..ProvidenceListQuery::default()
        })
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].providence, "T-1/2024");
    assert_eq!(listings[0].document_count, 12);
    assert_eq!(listings[0].source.as_deref(), Some("corte"));
    assert_eq!(listings[1].year, Some(2024));
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let result = client(&server)
        .search_by_providence(&ProvidenceQuery {
            providence: "T-1/2024".to_string(),
            top_k: 10,
            additional_filters: None,
        })
        .await;
    assert!(matches!(
        result,
        Err(SearchError::Status { status: 403, ref body }) if body == "Forbidden"
    ));
}

#[tokio::test]
async fn test_invalid_filter_field_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(0)
        .mount(&server)
        .await;

    let mut filters = Filters::new();
    filters.insert("year eq 1 or true".into(), FilterValue::Integer(1));
    let result = client(&server)
        .search_cases(&CaseQuery {
            query: "x".to_string(),
            top_k: 6,
            filters: Some(filters),
        })
        .await;
    assert!(matches!(result, Err(SearchError::InvalidFilter(_))));
}
