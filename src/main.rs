use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use helpdesk_assist::config::{LoggingSettings, Settings};
use helpdesk_assist::core::{Assistant, Matcher};
use helpdesk_assist::routes::{self, AppState, RouteOptions};
use helpdesk_assist::services::{
    AuthClient, BackendClient, ChatClient, EmailClient, KnowledgeCache, TokenVerifier,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn startup_error(what: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", what, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", what, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_tracing(&settings.logging);

    info!("Starting helpdesk-assist v{}", env!("CARGO_PKG_VERSION"));

    let backend = BackendClient::new(
        settings.backend.url.clone(),
        settings.backend.api_key.clone(),
        settings.backend.tables.clone().into(),
    )
    .map_err(|e| startup_error("Failed to create backend client", e))?;

    let auth = AuthClient::new(settings.backend.url.clone(), settings.backend.api_key.clone())
        .map_err(|e| startup_error("Failed to create auth client", e))?;

    let verifier = TokenVerifier::new(&settings.auth.jwt_secret, &settings.auth.audience);

    let email = EmailClient::new(
        settings.email.api_url.clone(),
        settings.email.api_key.clone(),
        settings.email.from.clone(),
    )
    .map_err(|e| startup_error("Failed to create email client", e))?;

    if !email.is_enabled() {
        info!("No email API key configured, ticket notifications are disabled");
    }

    let chat = ChatClient::new(
        settings.chat.api_url.clone(),
        settings.chat.api_key.clone(),
        settings.chat.model.clone(),
        Duration::from_secs(settings.chat.timeout_secs),
    )
    .map_err(|e| startup_error("Failed to create chat client", e))?;

    info!(
        "Backend client initialized (chat: {}, llm fallback: {})",
        chat.is_enabled(),
        settings.assistant.llm_fallback
    );

    let cache = KnowledgeCache::new(settings.cache.ttl_secs);

    let params = settings.matching.params();
    let matcher = Matcher::new(params);
    info!("Matcher initialized with params: {:?}", params);

    let options = RouteOptions {
        default_limit: settings.matching.default_limit,
        max_limit: settings.matching.max_limit,
        llm_fallback: settings.assistant.llm_fallback,
        entry_photos_bucket: settings.storage.entry_photos_bucket.clone(),
        ticket_images_bucket: settings.storage.ticket_images_bucket.clone(),
        max_upload_bytes: settings.storage.max_upload_bytes,
    };
    let max_upload_bytes = options.max_upload_bytes;

    // Build application state
    let app_state = AppState {
        backend: Arc::new(backend),
        auth: Arc::new(auth),
        verifier: Arc::new(verifier),
        email: Arc::new(email),
        chat: Arc::new(chat),
        cache: Arc::new(cache),
        matcher: matcher.clone(),
        assistant: Assistant::new(matcher),
        options,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(routes::handle_path_error))
            // Raw photo uploads; the handlers enforce the exact limit
            .app_data(web::PayloadConfig::new(max_upload_bytes + 1))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
