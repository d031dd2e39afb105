//! End-to-end tests against a mock prediction service.

use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use scan_client::{
    AnalysisOutcome, ClientConfig, ClientError, Controller, HttpPredictionService,
    PredictionService, SelectedFile, ServiceResponse,
};

#[derive(Debug, Clone)]
struct Upload {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    uploads: Arc<Mutex<Vec<Upload>>>,
}

async fn predict_handler(
    State(state): State<MockState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let upload = Upload {
            field: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(String::from),
            content_type: field.content_type().map(String::from),
            bytes: field.bytes().await.unwrap().to_vec(),
        };
        state.uploads.lock().unwrap().push(upload);
    }

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    (state.status, Json(state.reply.clone()))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

struct MockServer {
    addr: SocketAddr,
    uploads: Arc<Mutex<Vec<Upload>>>,
}

impl MockServer {
    fn config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_predict_url(&format!("http://{}/predict", self.addr))
            .unwrap()
    }

    fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

fn spawn_server(
    status: StatusCode,
    reply: Value,
    delay: Duration,
    with_health: bool,
) -> MockServer {
    let uploads = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        reply,
        delay,
        uploads: uploads.clone(),
    };

    let mut app = Router::new()
        .route("/predict", post(predict_handler))
        .with_state(state);
    if with_health {
        app = app.route("/health", get(health_check));
    }

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener)
        .unwrap()
        .serve(app.into_make_service());
    tokio::spawn(async move {
        server.await.unwrap();
    });

    MockServer { addr, uploads }
}

fn serve(reply: Value) -> MockServer {
    spawn_server(StatusCode::OK, reply, Duration::ZERO, true)
}

fn glioma() -> Value {
    json!({
        "prediction": "glioma",
        "tumor_info": {
            "name": "Glioma",
            "description": "...",
            "severity": "High",
            "action": "Consult specialist"
        },
        "confidence": 87.345,
        "all_probabilities": { "Glioma": 87.345, "Meningioma": 8.2, "No Tumor": 4.455 }
    })
}

fn tumor_png() -> SelectedFile {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([90, 90, 90]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )
        .unwrap();
    SelectedFile::new("tumor.png", "image/png", bytes)
}

#[tokio::test]
async fn uploads_file_field_and_renders_prediction() {
    let server = serve(glioma());
    let config = server.config();
    let service = HttpPredictionService::new(&config).unwrap();
    let mut controller = Controller::with_config(service, &config);

    let file = tumor_png();
    controller.pick_file(Some(file.clone())).await.unwrap();
    let outcome = controller.analyze_image().await.unwrap();
    assert_eq!(outcome, AnalysisOutcome::Rendered);

    let uploads = server.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field, "file");
    assert_eq!(uploads[0].file_name.as_deref(), Some("tumor.png"));
    assert_eq!(uploads[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(uploads[0].bytes, file.bytes);

    let screen = controller.screen();
    assert!(!screen.loading);
    let results = screen.results.expect("results visible");
    assert_eq!(results.name, "Glioma");
    assert_eq!(results.confidence_text, "87.3%");
    let probabilities: Vec<&str> = results.rows.iter().map(|r| r.probability.as_str()).collect();
    assert_eq!(probabilities, vec!["87.3%", "8.2%", "4.5%"]);
}

#[tokio::test]
async fn raw_service_call_keeps_prediction_key() {
    let server = serve(glioma());
    let service = HttpPredictionService::new(&server.config()).unwrap();

    match service.predict(&tumor_png()).await.unwrap() {
        ServiceResponse::Prediction(result) => {
            assert_eq!(result.prediction.as_deref(), Some("glioma"));
            assert_eq!(result.all_probabilities.len(), 3);
        }
        other => panic!("expected prediction, got {:?}", other),
    }
}

#[tokio::test]
async fn error_body_is_reported_whatever_the_status() {
    for status in [StatusCode::OK, StatusCode::BAD_REQUEST, StatusCode::INTERNAL_SERVER_ERROR] {
        let server = spawn_server(
            status,
            json!({ "error": "unsupported format" }),
            Duration::ZERO,
            true,
        );
        let config = server.config();
        let mut controller =
            Controller::with_config(HttpPredictionService::new(&config).unwrap(), &config);

        controller.handle_file(Some(tumor_png())).await.unwrap();
        let err = controller.analyze_image().await.unwrap_err();
        assert_eq!(err, ClientError::Service("unsupported format".to_string()));
        assert_eq!(err.to_string(), "Error: unsupported format");

        let screen = controller.screen();
        assert!(!screen.results_visible());
        assert!(!screen.loading);
    }
}

#[tokio::test]
async fn malformed_body_fails_closed() {
    let server = serve(json!({ "tumor_info": { "name": "Glioma" }, "confidence": 87.3 }));
    let config = server.config();
    let mut controller =
        Controller::with_config(HttpPredictionService::new(&config).unwrap(), &config);

    controller.handle_file(Some(tumor_png())).await.unwrap();
    let err = controller.analyze_image().await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
    assert!(err.to_string().starts_with("Analysis failed: "));
    assert!(!controller.screen().results_visible());
    assert!(!controller.screen().loading);
}

#[tokio::test]
async fn unreachable_service_clears_loading() {
    // Grab a free port, then close it
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let config = ClientConfig::default()
        .with_predict_url(&format!("http://{}/predict", addr))
        .unwrap();
    let mut controller =
        Controller::with_config(HttpPredictionService::new(&config).unwrap(), &config);

    controller.handle_file(Some(tumor_png())).await.unwrap();
    let err = controller.analyze_image().await.unwrap_err();
    assert!(matches!(err, ClientError::Request(_)));
    assert!(err.to_string().starts_with("Analysis failed: "));
    assert!(!controller.is_loading());
    assert!(controller.screen().preview_visible());
}

#[tokio::test]
async fn timeout_surfaces_as_request_failure() {
    let server = spawn_server(StatusCode::OK, glioma(), Duration::from_secs(3), true);
    let config = server.config().with_timeout(Some(Duration::from_millis(300)));
    let mut controller =
        Controller::with_config(HttpPredictionService::new(&config).unwrap(), &config);

    controller.handle_file(Some(tumor_png())).await.unwrap();
    let err = controller.analyze_image().await.unwrap_err();
    assert!(matches!(err, ClientError::Request(_)));
    assert!(!controller.screen().loading);
}

#[tokio::test]
async fn health_probe() {
    let server = serve(glioma());
    let service = HttpPredictionService::new(&server.config()).unwrap();
    assert!(service.check_health().await.unwrap());

    let bare = spawn_server(StatusCode::OK, glioma(), Duration::ZERO, false);
    let service = HttpPredictionService::new(&bare.config()).unwrap();
    assert!(!service.check_health().await.unwrap());
}

#[tokio::test]
async fn malformed_declared_type_uploads_as_octet_stream() {
    let server = serve(glioma());
    let config = server.config();
    let mut controller =
        Controller::with_config(HttpPredictionService::new(&config).unwrap(), &config);

    let png = tumor_png();
    let file = SelectedFile::new("odd.png", "image/x custom", png.bytes.clone());
    controller.handle_file(Some(file)).await.unwrap();

    let outcome = controller.analyze_image().await.unwrap();
    assert_eq!(outcome, AnalysisOutcome::Rendered);

    let uploads = server.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field, "file");
    assert_eq!(uploads[0].content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(uploads[0].bytes, png.bytes);
}
