//! reqwest-backed collaborators talking JSON to the learning-plan backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use crate::quiz_engine::{
    config::EngineConfig,
    errors::ServiceError,
    models::{
        CreatePlanRequest, CreatePlanResponse, GenerationRequest, GenerationResponse,
        SubmitAck, SubmitRequest,
    },
    services::{LearningPlanStore, QuestionGenerator},
};

/// Base URL, auth token and a client with the configured timeout.
#[derive(Debug, Clone)]
struct Backend {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl Backend {
    fn from_config(config: &EngineConfig) -> Result<Self, ServiceError> {
        let base_url = config
            .api_base_url
            .as_deref()
            .ok_or(ServiceError::NotConfigured("api_base_url"))?
            .trim_end_matches('/')
            .to_string();
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(Backend { client, base_url, auth_token: config.auth_token.clone() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::HttpStatus { status: status.as_u16(), message });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))
    }
}

pub struct HttpQuestionGenerator {
    backend: Backend,
}

impl HttpQuestionGenerator {
    pub fn from_config(config: &EngineConfig) -> Result<Self, ServiceError> {
        Ok(HttpQuestionGenerator { backend: Backend::from_config(config)? })
    }

    pub fn endpoint(&self) -> String {
        self.backend.url("learning-plans/generate-questions")
    }
}

#[async_trait]
impl QuestionGenerator for HttpQuestionGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ServiceError> {
        self.backend
            .post_json("learning-plans/generate-questions", request)
            .await
    }
}

pub struct HttpLearningPlanStore {
    backend: Backend,
}

impl HttpLearningPlanStore {
    pub fn from_config(config: &EngineConfig) -> Result<Self, ServiceError> {
        Ok(HttpLearningPlanStore { backend: Backend::from_config(config)? })
    }

    pub fn submit_endpoint(&self, learning_plan_id: &str) -> String {
        self.backend.url(&format!("learning-plans/{learning_plan_id}/submit"))
    }
}

#[async_trait]
impl LearningPlanStore for HttpLearningPlanStore {
    async fn create_plan(&self, request: &CreatePlanRequest) -> Result<CreatePlanResponse, ServiceError> {
        self.backend.post_json("learning-plans", request).await
    }

    async fn submit_answers(&self, request: &SubmitRequest) -> Result<SubmitAck, ServiceError> {
        let path = format!("learning-plans/{}/submit", request.learning_plan_id);
        self.backend.post_json(&path, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use crate::quiz_engine::models::Grounding;

    /// Accepts one connection, answers it with `status` and `body`, and
    /// yields the raw request it read.
    async fn serve_once(status: u16, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len(),
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            request
        });
        (url, handle)
    }

    /// Reads headers plus `content-length` bytes of body.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_ascii_lowercase();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn authed(url: &str) -> EngineConfig {
        EngineConfig {
            api_base_url: Some(url.to_string()),
            auth_token: Some("secret-token".to_string()),
            ..EngineConfig::default()
        }
    }

    fn submit_request(plan: &str) -> SubmitRequest {
        SubmitRequest {
            learning_plan_id: plan.to_string(),
            canonical_answers: BTreeMap::from([("q1".to_string(), 1)]),
            score: 1,
            total: 1,
            percentage: 100,
        }
    }

    fn config(url: Option<&str>) -> EngineConfig {
        EngineConfig {
            api_base_url: url.map(str::to_string),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn missing_base_url_is_not_configured() {
        assert!(matches!(
            HttpQuestionGenerator::from_config(&config(None)),
            Err(ServiceError::NotConfigured("api_base_url"))
        ));
    }

    #[test]
    fn endpoints_join_cleanly() {
        let c = config(Some("http://localhost:8000/api/"));
        let generator = HttpQuestionGenerator::from_config(&c).unwrap();
        assert_eq!(
            generator.endpoint(),
            "http://localhost:8000/api/learning-plans/generate-questions"
        );
        let store = HttpLearningPlanStore::from_config(&c).unwrap();
        assert_eq!(
            store.submit_endpoint("lp-7"),
            "http://localhost:8000/api/learning-plans/lp-7/submit"
        );
    }

    #[tokio::test]
    async fn error_status_maps_to_http_status_and_sends_bearer_token() {
        let (url, server) = serve_once(500, "boom").await;
        let generator = HttpQuestionGenerator::from_config(&authed(&url)).unwrap();

        let result = generator
            .generate(&GenerationRequest::new(&Grounding::Topic("sepsis".into()), 3))
            .await;
        assert_eq!(
            result,
            Err(ServiceError::HttpStatus { status: 500, message: "boom".to_string() })
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /learning-plans/generate-questions "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret-token"));
        assert!(request.contains(r#""topic":"sepsis""#));
    }

    #[tokio::test]
    async fn undecodable_body_is_a_parse_error_on_submit_path() {
        let (url, server) = serve_once(200, "not json").await;
        let store = HttpLearningPlanStore::from_config(&authed(&url)).unwrap();

        let result = store.submit_answers(&submit_request("lp-3")).await;
        assert!(matches!(result, Err(ServiceError::Parse(_))));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /learning-plans/lp-3/submit "));
        assert!(request.contains(r#""canonicalAnswers":{"q1":1}"#));
    }

    #[tokio::test]
    async fn create_plan_decodes_response_without_auth_header() {
        let (url, server) = serve_once(200, r#"{"success":true,"learningPlanId":"lp-9"}"#).await;
        let store = HttpLearningPlanStore::from_config(&config(Some(&url))).unwrap();

        let request = CreatePlanRequest {
            title: "Sepsis".into(),
            description: "Early recognition".into(),
            grounding_material: "sepsis".into(),
            canonical_questions: Vec::new(),
        };
        let response = store.create_plan(&request).await.unwrap();
        assert_eq!(response.learning_plan_id.as_deref(), Some("lp-9"));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /learning-plans "));
        assert!(!raw.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let store = HttpLearningPlanStore::from_config(&config(Some(&url))).unwrap();
        let result = store.submit_answers(&submit_request("lp-1")).await;
        assert!(matches!(result, Err(ServiceError::Network(_))));
    }
}
