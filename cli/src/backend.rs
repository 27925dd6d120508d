use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use macromate_core::api::{
    ApiEnvelope, BodyFatPrediction, BodyFatRequest, ChatReply, ChatRequest, FoodPrediction,
    HealthStatus,
};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to connect to the MacroMate backend at {url}. Is it running?")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Api(String),
    #[error("Unexpected response from backend: {0}")]
    Decode(String),
    #[error("{0}")]
    Invalid(String),
}

/// Client for the prediction backend (body-fat model, food classifier,
/// chatbot).
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("macromate-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read(&self, request: reqwest::RequestBuilder) -> Result<(u16, String), BackendError> {
        let connect = |source| BackendError::Connect {
            url: self.base_url.clone(),
            source,
        };
        let response = request.send().await.map_err(connect)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(connect)?;
        tracing::debug!(status, bytes = body.len(), "backend response");
        Ok((status, body))
    }

    pub async fn predict_body_fat(
        &self,
        req: &BodyFatRequest,
    ) -> Result<BodyFatPrediction, BackendError> {
        req.validate()
            .map_err(|e| BackendError::Invalid(e.to_string()))?;
        let url = self.url("/api/calculate/bodyfat");
        tracing::debug!(%url, "requesting body fat prediction");
        let (status, body) = self.read(self.client.post(&url).json(req)).await?;
        parse_envelope(status, &body)
    }

    /// Upload an image for classification as multipart field `image`.
    pub async fn predict_food(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<FoodPrediction, BackendError> {
        if image.is_empty() {
            return Err(BackendError::Invalid("Image file is empty".to_string()));
        }
        let mime = image_mime(file_name).ok_or_else(|| {
            BackendError::Invalid(format!(
                "Unsupported image type '{file_name}'. Use a .jpg, .jpeg, .png or .webp file"
            ))
        })?;
        let part = reqwest::multipart::Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| BackendError::Invalid(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let url = self.url("/api/predict/food");
        tracing::debug!(%url, file_name, "requesting food prediction");
        let (status, body) = self.read(self.client.post(&url).multipart(form)).await?;
        parse_food_prediction(status, &body)
    }

    pub async fn chat(&self, query: &str) -> Result<ChatReply, BackendError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(BackendError::Invalid("Query cannot be empty".to_string()));
        }
        let url = self.url("/api/chatbot");
        tracing::debug!(%url, "sending chat query");
        let req = ChatRequest {
            query: query.to_string(),
        };
        let (status, body) = self.read(self.client.post(&url).json(&req)).await?;
        parse_envelope(status, &body)
    }

    /// The health endpoint answers with a bare object, not an envelope.
    pub async fn health(&self) -> Result<HealthStatus, BackendError> {
        let url = self.url("/api/health");
        let (status, body) = self.read(self.client.get(&url)).await?;
        if !(200..300).contains(&status) {
            return Err(BackendError::Status {
                status,
                message: snippet(&body),
            });
        }
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

fn image_mime(file_name: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(file_name)
        .extension()?
        .to_str()?
        .to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response".to_string();
    }
    trimmed.chars().take(200).collect()
}

/// Decode a `{success, data | error}` envelope. Error envelopes win over the
/// HTTP status since the backend sends them with 4xx/5xx codes.
pub fn parse_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, BackendError> {
    match serde_json::from_str::<ApiEnvelope<T>>(body) {
        Ok(envelope) => envelope.into_result().map_err(BackendError::Api),
        Err(_) if !(200..300).contains(&status) => Err(BackendError::Status {
            status,
            message: snippet(body),
        }),
        Err(e) => Err(BackendError::Decode(e.to_string())),
    }
}

/// Food predictions arrive either inside an envelope or as the bare
/// `status`-tagged object.
pub fn parse_food_prediction(status: u16, body: &str) -> Result<FoodPrediction, BackendError> {
    if let Ok(prediction) = serde_json::from_str::<FoodPrediction>(body) {
        return Ok(prediction);
    }
    parse_envelope(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope_success() {
        let body = r#"{"success": true, "data": {"query": "how much protein?", "response": "About 1.6 g/kg.", "type": "knowledge", "sources": ["ISSN"], "processing_time_ms": 1.2, "confidence": 0.9}}"#;
        let reply: ChatReply = parse_envelope(200, body).unwrap();
        assert_eq!(reply.response, "About 1.6 g/kg.");
        assert_eq!(reply.reply_type, "knowledge");
    }

    #[test]
    fn test_parse_envelope_error_with_status() {
        let body = r#"{"success": false, "error": "Chatbot is not initialized. Please check server logs."}"#;
        let err = parse_envelope::<ChatReply>(503, body).unwrap_err();
        assert!(matches!(err, BackendError::Api(_)));
        assert_eq!(
            err.to_string(),
            "Chatbot is not initialized. Please check server logs."
        );
    }

    #[test]
    fn test_parse_envelope_non_json_error() {
        let err = parse_envelope::<ChatReply>(502, "<html>Bad Gateway</html>").unwrap_err();
        match err {
            BackendError::Status { status, message } => {
                assert_eq!(status, 502);
                assert!(message.contains("Bad Gateway"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_envelope_garbage_success() {
        let err = parse_envelope::<ChatReply>(200, "{}").unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn test_parse_food_prediction_bare_and_wrapped() {
        let bare = r#"{"status": "recognized", "food": "chicken_curry", "confidence": 87.0, "macros": {"calories": 240, "protein": 20, "carbs": 8, "fat": 14, "serving": "1 cup"}}"#;
        let prediction = parse_food_prediction(200, bare).unwrap();
        assert!(matches!(prediction, FoodPrediction::Recognized { .. }));

        let wrapped = r#"{"success": true, "data": {"status": "unknown", "message": "Not sure", "best_guess": "samosa", "confidence": 31.0}}"#;
        let prediction = parse_food_prediction(200, wrapped).unwrap();
        assert!(matches!(prediction, FoodPrediction::Unknown { .. }));
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime("lunch.JPG"), Some("image/jpeg"));
        assert_eq!(image_mime("plate.png"), Some("image/png"));
        assert_eq!(image_mime("notes.txt"), None);
        assert_eq!(image_mime("noext"), None);
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_query() {
        let client = BackendClient::new("http://localhost:5000").unwrap();
        let err = client.chat("   ").await.unwrap_err();
        assert_eq!(err.to_string(), "Query cannot be empty");
    }

    #[tokio::test]
    async fn test_predict_food_rejects_unsupported_file() {
        let client = BackendClient::new("http://localhost:5000").unwrap();
        let err = client
            .predict_food(vec![1, 2, 3], "meal.gif")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_connect_failure_message() {
        let client = BackendClient::new("http://127.0.0.1:1/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:1");
        let err = client.health().await.unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Failed to connect to the MacroMate backend at http://127.0.0.1:1")
        );
    }
}
