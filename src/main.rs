use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use curaduria_digital::config::AppConfig;
use curaduria_digital::error::AppError;
use curaduria_digital::telemetry;
use curaduria_digital::workflows::filing::{
    filing_router, ComplianceEngine, ExtractionAdapter, FilingService, InMemoryProjectStore,
    OfflineAnalyzer, OfflineCrossValidator, TracingNoticePublisher, ValidationState,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Curaduría Digital",
    about = "Run the building-permit filing service or demo its compliance engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a canned project with the deterministic fallback ruleset
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug, Default)]
struct DemoArgs {
    /// Declared project owner
    #[arg(long, default_value = "Juan Pérez")]
    owner: String,
    /// Locality used for the zone profile lookup
    #[arg(long, default_value = "Bosa")]
    locality: String,
    /// Floor count reported by the architectural extraction
    #[arg(long, default_value_t = 5)]
    floors: u32,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

fn build_service(
    config: &AppConfig,
) -> Arc<
    FilingService<OfflineAnalyzer, OfflineCrossValidator, InMemoryProjectStore, TracingNoticePublisher>,
> {
    // No collaborator client ships with the binary; the offline seams make
    // every document degrade to a configuration diagnostic and send the
    // engine down the deterministic fallback path.
    let adapter = ExtractionAdapter::new(Arc::new(OfflineAnalyzer), config.analysis.clone());
    let engine = ComplianceEngine::new(Arc::new(OfflineCrossValidator));
    Arc::new(FilingService::new(
        adapter,
        engine,
        Arc::new(InMemoryProjectStore::default()),
        Arc::new(TracingNoticePublisher),
    ))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let service = build_service(&config);

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(filing_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "curaduría digital filing service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Exercise the fallback ruleset offline: canned extractions for the title,
/// floor plans, structural, and signage documents, then a printed verdict.
async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    use curaduria_digital::workflows::filing::{
        requirement_catalog, ProjectId, ProjectRecord, ProjectStatus,
    };

    let mut documents = requirement_catalog();
    let canned: &[(&str, &[(&str, &str)])] = &[
        ("doc_tradicion", &[("propietario_titular", args.owner.as_str())]),
        ("arq_plantas", &[]),
        (
            "est_memorias",
            &[("norma_referencia", "NSR-10"), ("grupo_uso_edificacion", "Residencial")],
        ),
        ("doc_valla", &[("contiene_texto_curaduria", "true")]),
    ];
    let floors = args.floors.to_string();

    for document in documents.iter_mut() {
        if let Some((_, fields)) = canned
            .iter()
            .find(|(id, _)| *id == document.id.as_str())
        {
            document.state = ValidationState::Validated;
            let mut extracted: BTreeMap<String, String> = fields
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();
            if document.id.as_str() == "arq_plantas" {
                extracted.insert("numero_pisos_detectado".to_string(), floors.clone());
            }
            document.extracted = extracted;
        }
    }

    let project = ProjectRecord {
        id: ProjectId("demo".to_string()),
        tracking_number: "demo".to_string(),
        name: "Proyecto de demostración".to_string(),
        owner: args.owner.clone(),
        owner_id_number: "123".to_string(),
        address: "Calle 1 # 2-03".to_string(),
        registration_number: "050-000000".to_string(),
        locality: args.locality.clone(),
        license_type: None,
        modality: None,
        status: ProjectStatus::Filed,
        filed_at: chrono::Utc::now(),
        description: String::new(),
        report: None,
    };

    let engine = ComplianceEngine::new(Arc::new(OfflineCrossValidator))
        .with_fallback_latency(Duration::from_millis(0));
    let report = engine.evaluate(&project, &documents).await;

    println!(
        "Verdict: {}  (score {})",
        if report.approved { "APROBADO" } else { "REQUIERE SUBSANACIÓN" },
        report.score
    );
    for result in &report.results {
        println!(
            "  [{}] {} — detectado: {} / referencia: {}",
            if result.satisfied { "ok" } else { "!!" },
            result.rule,
            result.detected,
            result.reference
        );
        println!("       {}", result.explanation);
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
