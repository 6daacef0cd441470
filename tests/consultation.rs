//! Full consultation against mocked chat, embedding and search endpoints.

use std::sync::Arc;

use legal_consultor::agent::{
    AgentConfig, ConsultRequest, Consultation, FinalAnswer, LegalAssistant, PromptSet,
    create_provider,
};
use legal_consultor::search::{AzureSearchClient, OpenAiEmbedder, SearchConfig};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(message: &Value, finish_reason: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gemini-2.0-flash",
        "choices": [{"index": 0, "message": message, "finish_reason": finish_reason}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

fn assistant(server: &MockServer, max_tool_iterations: usize) -> LegalAssistant {
    let config = AgentConfig::builder()
        .api_key("gemini-key")
        .base_url(server.uri())
        .max_tool_iterations(max_tool_iterations)
        .build()
        .unwrap_or_else(|_| unreachable!());
    let search_config = SearchConfig::builder()
        .endpoint(server.uri())
        .index("casos")
        .api_key("search-key")
        .embed_dim(3)
        .build()
        .unwrap_or_else(|_| unreachable!());
    let embedder = OpenAiEmbedder::new(&config, &search_config).unwrap_or_else(|_| unreachable!());
    let search = AzureSearchClient::new(search_config, Arc::new(embedder))
        .unwrap_or_else(|_| unreachable!());
    let provider = create_provider(&config).unwrap_or_else(|_| unreachable!());
    LegalAssistant::new(
        Arc::from(provider),
        Arc::new(search),
        &config,
        &PromptSet::defaults(),
    )
}

async fn mount_retrieval(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]}],
            "model": "text-embedding-004",
            "usage": {"prompt_tokens": 3, "total_tokens": 3}
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/indexes/casos/docs/search"))
        .and(header("api-key", "search-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "@search.score": 3.2,
                "id": "doc-1",
                "title": "T-1/2024",
                "content": "La estabilidad laboral reforzada protege a la trabajadora embarazada.",
                "source": "corte",
                "date": "2024-03-01"
            }]
        })))
        .mount(server)
        .await;
}

async fn mount_final(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"response_format": {"type": "json_object"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            &json!({"role": "assistant", "content": content}),
            "stop",
        )))
        .with_priority(1)
        .mount(server)
        .await;
}

fn search_call(id: &str) -> Value {
    json!({
        "role": "assistant",
        "content": null,
        "tool_calls": [{
            "id": id,
            "type": "function",
            "function": {"name": "search_cases", "arguments": "{\"query\":\"despido embarazada\"}"}
        }]
    })
}

#[tokio::test]
async fn test_consultation_with_one_search_round() {
    let server = MockServer::start().await;
    mount_retrieval(&server).await;
    mount_final(
        &server,
        r#"{"answer":"No, goza de estabilidad reforzada [1].","citations":[{"id":"doc-1","title":"T-1/2024","source":"corte"}],"cases":[{"id":"T-1/2024","title":"T-1/2024","date":"2024-03-01"}],"disclaimer":"x"}"#,
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(&search_call("call_a"), "tool_calls")),
        )
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            &json!({"role": "assistant", "content": "Según [1], no pueden despedirla."}),
            "stop",
        )))
        .with_priority(3)
        .mount(&server)
        .await;

    let consultation = assistant(&server, 5)
        .consult(&ConsultRequest::new("¿Me pueden despedir estando embarazada?"))
        .await
        .unwrap_or_else(|_| unreachable!());

    let Consultation::Answered(outcome) = &consultation else {
        unreachable!()
    };
    assert_eq!(outcome.tool_rounds, 1);
    assert!(!outcome.capped);

    let answer: FinalAnswer =
        serde_json::from_str(consultation.reply()).unwrap_or_else(|_| unreachable!());
    assert_eq!(answer.citations[0].id, "doc-1");
    assert_eq!(answer.cases[0].date.as_deref(), Some("2024-03-01"));
    assert_eq!(answer.disclaimer, "Esto no constituye asesoría legal.");

    let requests = server.received_requests().await.unwrap_or_default();
    let search_body: Value = requests
        .iter()
        .find(|r| r.url.path() == "/indexes/casos/docs/search")
        .and_then(|r| serde_json::from_slice(&r.body).ok())
        .unwrap_or_default();
    assert_eq!(search_body["top"], 6);
    assert_eq!(search_body["search"], "despido embarazada");

    let chat_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/chat/completions")
        .count();
    assert_eq!(chat_calls, 3);
}

#[tokio::test]
async fn test_endless_tool_requests_are_capped() {
    let server = MockServer::start().await;
    mount_retrieval(&server).await;
    mount_final(&server, "Respuesta en texto plano.").await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(&search_call("call_0"), "tool_calls")),
        )
        .with_priority(2)
        .mount(&server)
        .await;

    let consultation = assistant(&server, 2)
        .consult(&ConsultRequest::new("¿Qué dice la jurisprudencia sobre el despido?"))
        .await
        .unwrap_or_else(|_| unreachable!());

    let Consultation::Answered(outcome) = &consultation else {
        unreachable!()
    };
    assert!(outcome.capped);
    assert_eq!(outcome.tool_rounds, 2);

    let answer: FinalAnswer =
        serde_json::from_str(consultation.reply()).unwrap_or_else(|_| unreachable!());
    assert_eq!(answer.answer, "Respuesta en texto plano.");
    assert!(answer.citations.is_empty());

    // The forced finalization request carries no unanswered tool calls.
    let requests = server.received_requests().await.unwrap_or_default();
    let final_body: Value = requests
        .iter()
        .rev()
        .find(|r| r.url.path() == "/chat/completions")
        .and_then(|r| serde_json::from_slice(&r.body).ok())
        .unwrap_or_default();
    let messages = final_body["messages"].as_array().cloned().unwrap_or_default();
    let calls: usize = messages
        .iter()
        .map(|m| m["tool_calls"].as_array().map_or(0, Vec::len))
        .sum();
    let answers = messages.iter().filter(|m| m["role"] == "tool").count();
    assert_eq!(calls, answers);
    assert!(final_body.get("tools").is_none());
}
