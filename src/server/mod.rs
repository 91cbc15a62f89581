//! HTTP surface of the extractor.
//!
//! Endpoints:
//! - POST /extract-content/ - extract name and job title from an uploaded image
//! - GET /health - liveness check

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::extractors::FieldsExtractor;

mod error_response;

mod extract_content;
pub use extract_content::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    extractor: FieldsExtractor,
}

impl AppState {
    pub fn new(extractor: FieldsExtractor) -> Self {
        Self {
            inner: Arc::new(AppStateInner { extractor }),
        }
    }

    pub fn extractor(&self) -> &FieldsExtractor {
        &self.inner.extractor
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState, max_upload_size: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/extract-content/", post(extract_content))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common_types::{OcrTextFragment, TextImageCoords};
    use crate::extractors::{FieldsExtractorOptions, OllamaLlmOptions};
    use crate::file_converters::ocr::Ocr;
    use crate::file_converters::FileConverters;
    use crate::AppResult;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::net::TcpListener;
    use tower::ServiceExt;
    use url::Url;

    const MAX_TEST_UPLOAD_SIZE: usize = 1024 * 1024;

    struct CountingOcr {
        calls: AtomicUsize,
        lines: Vec<String>,
    }

    impl CountingOcr {
        fn new(lines: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                lines: lines.iter().map(|line| line.to_string()).collect(),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Ocr for CountingOcr {
        fn image_to_text(&self, _image: image::DynamicImage) -> AppResult<Vec<OcrTextFragment>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .lines
                .iter()
                .enumerate()
                .map(|(index, line)| OcrTextFragment {
                    text: line.clone(),
                    coords: TextImageCoords {
                        x1: 0.0,
                        y1: index as f32 * 10.0,
                        x2: 100.0,
                        y2: index as f32 * 10.0 + 8.0,
                    },
                })
                .collect())
        }
    }

    #[derive(Clone, Default)]
    struct FakeOllama {
        calls: Arc<AtomicUsize>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl FakeOllama {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    async fn serve_on_ephemeral_port(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    async fn start_fake_ollama(status: StatusCode, body: serde_json::Value) -> (Url, FakeOllama) {
        let fake = FakeOllama::default();
        let handler_fake = fake.clone();
        let app = Router::new().route(
            "/api/generate",
            post(move |Json(request): Json<serde_json::Value>| {
                let fake = handler_fake.clone();
                let body = body.clone();
                async move {
                    fake.calls.fetch_add(1, Ordering::SeqCst);
                    if let Some(prompt) = request.get("prompt").and_then(|p| p.as_str()) {
                        fake.prompts.lock().unwrap().push(prompt.to_string());
                    }
                    (status, Json(body))
                }
            }),
        );
        let base_url = serve_on_ephemeral_port(app).await;
        (
            Url::parse(&format!("{}/api/generate", base_url)).unwrap(),
            fake,
        )
    }

    fn app_router(ocr: Arc<CountingOcr>, llm_api_url: Url) -> Router {
        let extractor = FieldsExtractor::new(
            FieldsExtractorOptions {
                ollama_llm_options: OllamaLlmOptions {
                    api_url: llm_api_url,
                    model: "llama3".to_string().into(),
                },
            },
            FileConverters::new(ocr),
        );
        router(AppState::new(extractor), MAX_TEST_UPLOAD_SIZE)
    }

    async fn start_app(ocr: Arc<CountingOcr>, llm_api_url: Url) -> String {
        serve_on_ephemeral_port(app_router(ocr, llm_api_url)).await
    }

    fn png_bytes() -> Vec<u8> {
        let image = image::RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        let mut output = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut output, image::ImageFormat::Png)
            .unwrap();
        output.into_inner()
    }

    async fn post_file(
        base_url: &str,
        field_name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> (StatusCode, String) {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name("card.png")
            .mime_str(content_type)
            .unwrap();
        let form = reqwest::multipart::Form::new().part(field_name.to_string(), part);
        let response = reqwest::Client::new()
            .post(format!("{}/extract-content/", base_url))
            .multipart(form)
            .send()
            .await
            .unwrap();
        (response.status(), response.text().await.unwrap())
    }

    fn as_json(body: &str) -> serde_json::Value {
        serde_json::from_str(body).unwrap()
    }

    fn llm_answer(answer: &str) -> serde_json::Value {
        json!({ "model": "llama3", "response": answer, "done": true })
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected_before_ocr_and_llm() {
        let ocr = CountingOcr::new(&["张三"]);
        let (llm_url, fake) = start_fake_ollama(StatusCode::OK, llm_answer("{}")).await;
        let base_url = start_app(ocr.clone(), llm_url).await;

        for content_type in ["text/plain", "application/pdf", "application/octet-stream"] {
            let (status, body) =
                post_file(&base_url, "file", b"%PDF-1.7".to_vec(), content_type).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(as_json(&body), json!({"detail": "上传的文件必须是图片格式"}));
        }
        assert_eq!(ocr.calls(), 0);
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn extracts_fields_from_llm_answer() {
        let ocr = CountingOcr::new(&["张三", "销售部 经理", "电话 138"]);
        let (llm_url, fake) = start_fake_ollama(
            StatusCode::OK,
            json!({ "response": "{\"姓名\": \"张三\", \"职位\": \"经理\"}" }),
        )
        .await;
        let base_url = start_app(ocr.clone(), llm_url).await;

        let (status, body) = post_file(&base_url, "file", png_bytes(), "image/png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body), json!({"姓名": "张三", "职位": "经理"}));
        assert_eq!(ocr.calls(), 1);
        assert_eq!(fake.calls(), 1);

        let prompts = fake.prompts.lock().unwrap();
        assert!(prompts[0].contains(r#"```["张三", "销售部 经理", "电话 138"]```"#));
    }

    #[tokio::test]
    async fn empty_ocr_result_still_calls_llm() {
        let ocr = CountingOcr::new(&[]);
        let (llm_url, fake) = start_fake_ollama(
            StatusCode::OK,
            llm_answer(r#"{"姓名": "未找到相关信息", "职位": "未找到相关信息"}"#),
        )
        .await;
        let base_url = start_app(ocr.clone(), llm_url).await;

        let (status, body) = post_file(&base_url, "file", png_bytes(), "image/png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            as_json(&body),
            json!({"姓名": "未找到相关信息", "职位": "未找到相关信息"})
        );
        assert_eq!(fake.calls(), 1);
        assert!(fake.prompts.lock().unwrap()[0].contains("OCR文字：```[]```"));
    }

    #[tokio::test]
    async fn unparseable_llm_answer_is_malformed_response() {
        let ocr = CountingOcr::new(&["张三"]);
        let (llm_url, _fake) =
            start_fake_ollama(StatusCode::OK, llm_answer("姓名是张三，职位是经理")).await;
        let base_url = start_app(ocr, llm_url).await;

        let (status, body) = post_file(&base_url, "file", png_bytes(), "image/jpeg").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(as_json(&body), json!({"detail": "模型响应格式错误"}));
    }

    #[tokio::test]
    async fn llm_error_status_is_llm_call_failure() {
        let ocr = CountingOcr::new(&["张三"]);
        let (llm_url, fake) = start_fake_ollama(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": "model is loading" }),
        )
        .await;
        let base_url = start_app(ocr, llm_url).await;

        let (status, body) = post_file(&base_url, "file", png_bytes(), "image/png").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(as_json(&body), json!({"detail": "调用大模型失败"}));
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn missing_response_field_is_error_record() {
        let ocr = CountingOcr::new(&["张三"]);
        let (llm_url, _fake) =
            start_fake_ollama(StatusCode::OK, json!({ "model": "llama3", "done": true })).await;
        let base_url = start_app(ocr, llm_url).await;

        let (status, body) = post_file(&base_url, "file", png_bytes(), "image/png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body), json!({"error": "模型未返回有效数据"}));
    }

    #[tokio::test]
    async fn null_response_field_is_internal_error() {
        let ocr = CountingOcr::new(&["张三"]);
        let (llm_url, fake) = start_fake_ollama(
            StatusCode::OK,
            json!({ "model": "llama3", "response": null, "done": true }),
        )
        .await;
        let base_url = start_app(ocr, llm_url).await;

        let (status, body) = post_file(&base_url, "file", png_bytes(), "image/png").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(as_json(&body), json!({"detail": "内部服务器错误"}));
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn oversized_upload_is_bad_request() {
        let ocr = CountingOcr::new(&["张三"]);
        let (llm_url, fake) = start_fake_ollama(StatusCode::OK, llm_answer("{}")).await;
        let app = app_router(ocr.clone(), llm_url);

        let mut body = concat!(
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"card.png\"\r\n",
            "Content-Type: image/png\r\n\r\n"
        )
        .as_bytes()
        .to_vec();
        body.extend_from_slice(&vec![0u8; 2 * MAX_TEST_UPLOAD_SIZE]);
        body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/extract-content/")
            .header(
                axum::http::header::CONTENT_TYPE,
                "multipart/form-data; boundary=BOUNDARY",
            )
            .body(axum::body::Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"detail": "上传请求格式错误"}));
        assert_eq!(ocr.calls(), 0);
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn undecodable_image_is_internal_error() {
        let ocr = CountingOcr::new(&["张三"]);
        let (llm_url, fake) = start_fake_ollama(StatusCode::OK, llm_answer("{}")).await;
        let base_url = start_app(ocr.clone(), llm_url).await;

        let (status, body) =
            post_file(&base_url, "file", b"not really a png".to_vec(), "image/png").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(as_json(&body), json!({"detail": "内部服务器错误"}));
        assert_eq!(ocr.calls(), 0);
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn unreachable_llm_is_internal_error() {
        let ocr = CountingOcr::new(&["张三"]);
        let unused_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let unused_addr = unused_listener.local_addr().unwrap();
        drop(unused_listener);
        let llm_url = Url::parse(&format!("http://{}/api/generate", unused_addr)).unwrap();
        let base_url = start_app(ocr, llm_url).await;

        let (status, body) = post_file(&base_url, "file", png_bytes(), "image/png").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(as_json(&body), json!({"detail": "内部服务器错误"}));
    }

    #[tokio::test]
    async fn upload_without_file_field_is_bad_request() {
        let ocr = CountingOcr::new(&["张三"]);
        let (llm_url, fake) = start_fake_ollama(StatusCode::OK, llm_answer("{}")).await;
        let base_url = start_app(ocr.clone(), llm_url).await;

        let (status, body) = post_file(&base_url, "image", png_bytes(), "image/png").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(as_json(&body), json!({"detail": "未找到上传的文件"}));
        assert_eq!(ocr.calls(), 0);
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn repeated_requests_give_identical_bodies() {
        let ocr = CountingOcr::new(&["李四", "高级工程师"]);
        let (llm_url, _fake) = start_fake_ollama(
            StatusCode::OK,
            llm_answer(r#"{"姓名": "李四", "职位": "高级工程师"}"#),
        )
        .await;
        let base_url = start_app(ocr.clone(), llm_url).await;

        let mut bodies = Vec::new();
        for _ in 0..3 {
            let (status, body) = post_file(&base_url, "file", png_bytes(), "image/png").await;
            assert_eq!(status, StatusCode::OK);
            bodies.push(body);
        }
        assert_eq!(bodies[0], r#"{"姓名":"李四","职位":"高级工程师"}"#);
        assert!(bodies.iter().all(|body| body == &bodies[0]));
        assert_eq!(ocr.calls(), 3);
    }

    #[tokio::test]
    async fn health_reports_version() {
        let ocr = CountingOcr::new(&[]);
        let (llm_url, _fake) = start_fake_ollama(StatusCode::OK, llm_answer("{}")).await;
        let base_url = start_app(ocr, llm_url).await;

        let response = reqwest::get(format!("{}/health", base_url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
