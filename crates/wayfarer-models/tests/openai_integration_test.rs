//! Integration tests for the OpenAI provider against a mock server.

use mockito::Matcher;
use serde_json::json;
use wayfarer_abstraction::{ChatMessage, ChatModel, Embedder, ModelError, ToolDefinition};
use wayfarer_models::{OpenAIEmbedder, OpenAIModel};

fn exit_tool() -> ToolDefinition {
    ToolDefinition {
        name: "exit".to_string(),
        description: "Leave the chatbot".to_string(),
        parameters: json!({"type": "object", "properties": {}}),
    }
}

/// A tool-call reply is decoded into a provider-neutral `ToolCall`.
#[tokio::test]
async fn test_chat_completion_decodes_tool_call() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({"model": "gpt-3.5-turbo-1106"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "chatcmpl-1",
                "model": "gpt-3.5-turbo-1106",
                "choices": [{
                    "index": 0,
                    "finish_reason": "tool_calls",
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc",
                            "type": "function",
                            "function": {"name": "move_to_node", "arguments": "{\"node\":\"결제 문의\"}"}
                        }]
                    }
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let model = OpenAIModel::with_api_key("gpt-3.5-turbo-1106".to_string(), "test-key".to_string())
        .with_base_url(server.url());
    let response = model
        .generate_chat_completion(&[ChatMessage::user("결제가 안 돼요")], &[exit_tool()], None)
        .await
        .unwrap();

    mock.assert_async().await;
    let call = response.message.first_tool_call().unwrap();
    assert_eq!(call.id, "call_abc");
    assert_eq!(call.name, "move_to_node");
    assert_eq!(call.parse_arguments().unwrap()["node"], "결제 문의");
    assert_eq!(response.finish_reason.as_deref(), Some("tool_calls"));
    assert_eq!(response.usage.unwrap().total_tokens, 17);
}

/// A plain-text reply has no tool calls.
#[tokio::test]
async fn test_chat_completion_plain_text() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{"message": {"role": "assistant", "content": "안녕하세요"}, "finish_reason": "stop"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let model = OpenAIModel::with_api_key("gpt-4".to_string(), "k".to_string()).with_base_url(server.url());
    let response = model.generate_chat_completion(&[], &[], None).await.unwrap();
    assert!(response.message.tool_calls.is_empty());
    assert_eq!(response.message.text(), "안녕하세요");
    assert_eq!(response.model_id.as_deref(), Some("gpt-4"));
}

/// Rate limiting surfaces as a hard-stop quota error.
#[tokio::test]
async fn test_chat_completion_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":{"message":"Rate limit reached"}}"#)
        .create_async()
        .await;

    let model = OpenAIModel::with_api_key("gpt-4".to_string(), "k".to_string()).with_base_url(server.url());
    let err = model.generate_chat_completion(&[], &[], None).await.unwrap_err();
    assert!(matches!(err, ModelError::QuotaExceeded { ref provider, .. } if provider == "openai"));
}

/// An empty choices array is a response error, not a panic.
#[tokio::test]
async fn test_chat_completion_without_choices() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let model = OpenAIModel::with_api_key("gpt-4".to_string(), "k".to_string()).with_base_url(server.url());
    let err = model.generate_chat_completion(&[], &[], None).await.unwrap_err();
    assert!(matches!(err, ModelError::ModelResponseError(_)));
}

#[tokio::test]
async fn test_embedding_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .match_body(Matcher::PartialJson(json!({"model": "text-embedding-3-small"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"object":"list","data":[{"index":0,"embedding":[0.1,0.2,0.3]}]}"#)
        .create_async()
        .await;

    let embedder = OpenAIEmbedder::with_api_key("text-embedding-3-small".to_string(), "k".to_string())
        .with_base_url(server.url());
    let vector = embedder.embed("환불 문의").await.unwrap();

    mock.assert_async().await;
    assert_eq!(vector.len(), 3);
    assert!((vector[1] - 0.2).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_embedding_server_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(500)
        .with_body("internal")
        .create_async()
        .await;

    let embedder =
        OpenAIEmbedder::with_api_key("m".to_string(), "k".to_string()).with_base_url(server.url());
    let err = embedder.embed("x").await.unwrap_err();
    assert!(matches!(err, ModelError::ModelResponseError(_)));
}
