//! Servidor web Axum com WebSocket para desambiguação de sentidos em tempo real

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wsd_core::{
    corpus::demo_texts,
    enrich,
    enrichment::explainer_from_config,
    pipeline::{PipelineEvent, WsdPipeline},
    recommend, DisambiguationReport, Explainer, Recommendation, SenseEnrichment, WsdConfig, WsdError,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: WsdPipeline,
    explainer: Arc<dyn Explainer>,
    top_senses: usize,
    enrich_concurrency: usize,
    request_timeout: Duration,
}

#[derive(Deserialize)]
struct DisambiguateRequest {
    text: String,
    /// Gera explicações para os sentidos escolhidos.
    #[serde(default)]
    enrich: bool,
}

/// Mensagem WebSocket recebida do cliente
#[derive(Deserialize)]
struct WsRequest {
    text: String,
}

#[derive(Serialize)]
struct DisambiguateResponse {
    report: DisambiguationReport,
    recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enrichment: Option<Vec<SenseEnrichment>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = WsdConfig::from_env()?;
    let pipeline = WsdPipeline::from_config(&config)?;

    let state = Arc::new(AppState {
        pipeline,
        explainer: explainer_from_config(&config.enrichment),
        top_senses: config.enrichment.top_senses,
        enrich_concurrency: config.enrichment.concurrency_limit,
        request_timeout: config.request_timeout(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/disambiguate", post(disambiguate_handler))
        .route("/demo-texts", get(demo_texts_handler))
        .route("/ws", get(ws_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state);

    let addr = std::env::var("WSD_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Servidor WSD iniciado em http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Status do serviço
async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "wsd-web",
        "status": "running",
        "annotator": state.pipeline.annotator().name(),
        "model": state.pipeline.model_id(),
        "explainer": state.explainer.name(),
    }))
}

/// Verifica o serviço de anotação
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let annotation = state.pipeline.annotator().health().await;
    let status = if annotation.available { "healthy" } else { "degraded" };
    Json(serde_json::json!({
        "status": status,
        "annotation": annotation,
        "model": state.pipeline.model_id(),
    }))
}

fn error_response(err: &WsdError) -> Response {
    let status = match err {
        WsdError::AnnotationUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        WsdError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

/// Desambiguação via HTTP POST (sem streaming)
async fn disambiguate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DisambiguateRequest>,
) -> Response {
    if req.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Texto vazio"})),
        )
            .into_response();
    }

    let report = match state.pipeline.analyze_with_timeout(&req.text, state.request_timeout).await {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "Falha ao desambiguar");
            return error_response(&err);
        }
    };

    let recommendations = recommend(&report);
    let enrichment = if req.enrich {
        // cada chamada tem prazo próprio; as que expiram recebem o texto offline
        Some(enrich(&report, &state.explainer, state.top_senses, state.enrich_concurrency).await)
    } else {
        None
    };

    Json(DisambiguateResponse {
        report,
        recommendations,
        enrichment,
    })
    .into_response()
}

/// Retorna textos de demonstração
async fn demo_texts_handler() -> impl IntoResponse {
    let texts: Vec<serde_json::Value> = demo_texts()
        .iter()
        .map(|(word, text)| {
            serde_json::json!({
                "word": word,
                "text": text
            })
        })
        .collect();
    Json(texts)
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe texto, executa o pipeline e repassa os eventos à medida que chegam
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                // Aceita JSON {text} ou texto puro
                let text = serde_json::from_str::<WsRequest>(&text)
                    .map(|req| req.text)
                    .unwrap_or_else(|_| text.to_string())
                    .trim()
                    .to_string();
                if text.is_empty() {
                    continue;
                }

                info!(chars = text.chars().count(), "Analisando via WebSocket");

                let (tx, mut rx) = mpsc::unbounded_channel::<PipelineEvent>();
                let pipeline = state.pipeline.clone();
                let timeout = state.request_timeout;
                let task = tokio::spawn(async move {
                    let events = tx.clone();
                    let result = tokio::time::timeout(timeout, pipeline.analyze_streaming(&text, tx)).await;
                    if result.is_err() {
                        let _ = events.send(PipelineEvent::Error {
                            message: WsdError::Cancelled.to_string(),
                        });
                    }
                });

                while let Some(event) = rx.recv().await {
                    let Ok(json) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        // cliente desconectou
                        task.abort();
                        return;
                    }
                }
                if let Err(err) = task.await {
                    warn!(error = %err, "Tarefa de análise terminou com erro");
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
