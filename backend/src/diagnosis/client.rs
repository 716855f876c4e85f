use reqwest::Client as HttpClient;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use sha2::{Digest, Sha256};
use shared::{DiagnosisResult, ImagePayload};
use url::Url;

pub const GENERIC_UPSTREAM_ERROR: &str = "Prediction failed";

#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error("{0}")]
    Upstream(String),
}

impl DiagnosisError {
    pub fn message(&self) -> &str {
        match self {
            DiagnosisError::Upstream(message) => message,
        }
    }
}

/// Talks to the external plant-disease model.
#[derive(Clone)]
pub struct InferenceClient {
    http_client: HttpClient,
    predict_url: Url,
}

impl InferenceClient {
    pub fn new(http_client: HttpClient, predict_url: Url) -> Self {
        Self {
            http_client,
            predict_url,
        }
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }

    /// Uploads the image as multipart field `image` and maps the reply.
    ///
    /// Only transport failures and non-2xx statuses are errors; a 2xx body of
    /// any shape yields a fully defaulted record.
    pub async fn diagnose(&self, payload: ImagePayload) -> Result<DiagnosisResult, DiagnosisError> {
        let digest = image_digest(payload.bytes());
        log::info!(
            "Submitting {} ({}, {} bytes, sha256 {}) to {}",
            payload.filename(),
            payload.mime(),
            payload.len(),
            &digest[..12],
            self.predict_url
        );

        let (bytes, mime, filename) = payload.into_parts();
        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str(mime.as_ref())
            .map_err(|e| DiagnosisError::Upstream(e.to_string()))?;
        let form = Form::new().part("image", part);

        let response = self
            .http_client
            .post(self.predict_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::error!("Inference request failed: {:?}", e);
                DiagnosisError::Upstream(format!("Inference service unreachable: {}", e))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            log::error!("Failed to read inference response body: {:?}", e);
            DiagnosisError::Upstream(format!("Failed to read inference response: {}", e))
        })?;

        if !status.is_success() {
            let message = upstream_error_message(&body);
            log::warn!("Inference service returned {}: {}", status, message);
            return Err(DiagnosisError::Upstream(message));
        }

        let json = serde_json::from_slice::<Value>(&body).unwrap_or_else(|e| {
            log::warn!("Inference response is not JSON ({}), using defaults", e);
            Value::Null
        });
        let result = DiagnosisResult::from_upstream(&json);
        log::info!(
            "Diagnosis for {}: {} ({:.1}%)",
            &digest[..12],
            result.headline(),
            result.confidence
        );
        Ok(result)
    }
}

fn upstream_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_UPSTREAM_ERROR.to_string())
}

pub fn image_digest(image_data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use actix_multipart::Multipart;
    use actix_web::dev::ServerHandle;
    use actix_web::{App, HttpResponse, HttpServer, web};
    use futures::TryStreamExt;
    use serde_json::json;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    pub struct ReceivedField {
        pub name: String,
        pub filename: Option<String>,
        pub content_type: Option<String>,
        pub len: usize,
    }

    /// Scripted stand-in for the inference service.
    #[derive(Clone)]
    pub struct FakeModel {
        pub status: u16,
        pub body: String,
        pub received: Arc<Mutex<Vec<ReceivedField>>>,
    }

    impl FakeModel {
        pub fn new(status: u16, body: impl Into<String>) -> Self {
            Self {
                status,
                body: body.into(),
                received: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn calls(&self) -> usize {
            self.received.lock().unwrap().len()
        }
    }

    async fn predict(model: web::Data<FakeModel>, mut payload: Multipart) -> actix_web::Result<HttpResponse> {
        while let Some(mut field) = payload.try_next().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);
            let content_type = field.content_type().map(|m| m.to_string());
            let mut len = 0;
            while let Some(chunk) = field.try_next().await? {
                len += chunk.len();
            }
            model.received.lock().unwrap().push(ReceivedField {
                name,
                filename,
                content_type,
                len,
            });
        }
        let status = actix_web::http::StatusCode::from_u16(model.status).unwrap();
        Ok(HttpResponse::build(status)
            .content_type("application/json")
            .body(model.body.clone()))
    }

    pub fn spawn_fake_model(model: FakeModel) -> (SocketAddr, ServerHandle) {
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(model.clone()))
                .route("/api/predict", web::post().to(predict))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (addr, handle)
    }

    pub fn client_for(addr: SocketAddr) -> InferenceClient {
        let url = crate::config::predict_url(&format!("http://{}", addr)).unwrap();
        InferenceClient::new(HttpClient::new(), url)
    }

    fn jpeg(len: usize) -> ImagePayload {
        ImagePayload::from_file(vec![0xAB; len], "image/jpeg", "leaf.jpg").unwrap()
    }

    #[actix_web::test]
    async fn test_uploads_multipart_and_maps_partial_body() {
        let model = FakeModel::new(
            200,
            json!({
                "plant_name_cnn": "Tomato",
                "confidence": 92.5,
                "top_3_predictions": [{"plant": "Tomato", "confidence": 92.5}]
            })
            .to_string(),
        );
        let (addr, handle) = spawn_fake_model(model.clone());

        let result = client_for(addr).diagnose(jpeg(2 * 1024 * 1024)).await.unwrap();

        assert_eq!(result.plant_name_cnn, "Tomato");
        assert_eq!(result.confidence, 92.5);
        assert_eq!(result.location, "Unknown");
        assert_eq!(result.diseases_treated, "Not specified");
        assert_eq!(result.top3_predictions.len(), 1);

        let received = model.received.lock().unwrap().clone();
        assert_eq!(
            received,
            vec![ReceivedField {
                name: "image".into(),
                filename: Some("leaf.jpg".into()),
                content_type: Some("image/jpeg".into()),
                len: 2 * 1024 * 1024,
            }]
        );
        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_error_status_uses_upstream_message() {
        let model = FakeModel::new(500, r#"{"error":"model unavailable"}"#);
        let (addr, handle) = spawn_fake_model(model);

        let err = client_for(addr).diagnose(jpeg(16)).await.unwrap_err();
        assert_eq!(err.message(), "model unavailable");
        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_error_status_with_unparseable_body() {
        let model = FakeModel::new(503, "<html>Bad Gateway</html>");
        let (addr, handle) = spawn_fake_model(model);

        let err = client_for(addr).diagnose(jpeg(16)).await.unwrap_err();
        assert_eq!(err.message(), GENERIC_UPSTREAM_ERROR);
        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_non_json_success_body_maps_to_defaults() {
        let model = FakeModel::new(200, "ok");
        let (addr, handle) = spawn_fake_model(model);

        let result = client_for(addr).diagnose(jpeg(16)).await.unwrap();
        assert_eq!(result, DiagnosisResult::default());
        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_unreachable_service_is_upstream_error() {
        let client = InferenceClient::new(
            HttpClient::new(),
            Url::parse("http://127.0.0.1:9/api/predict").unwrap(),
        );
        let err = client.diagnose(jpeg(16)).await.unwrap_err();
        assert!(err.message().starts_with("Inference service unreachable"));
    }

    #[test]
    fn test_upstream_error_message_fallbacks() {
        assert_eq!(upstream_error_message(br#"{"error":"boom"}"#), "boom");
        assert_eq!(upstream_error_message(br#"{"error":""}"#), GENERIC_UPSTREAM_ERROR);
        assert_eq!(upstream_error_message(br#"{"error":17}"#), GENERIC_UPSTREAM_ERROR);
        assert_eq!(upstream_error_message(b""), GENERIC_UPSTREAM_ERROR);
    }
}
