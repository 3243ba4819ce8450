//! HTTP surface
//!
//! Provides an axum router that:
//! - Creates, reads, updates and deletes the four record kinds under `/<kind>`
//! - Accepts permissive upserts and deletes under `/emit/<kind>`
//! - Streams every accepted change to clients as Server-Sent Events on `/events`
//! - Lists the registered discriminators on `/kinds`

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::{get, post},
    Json, Router,
};
use std::{convert::Infallible, future::Future, sync::Arc, time::Duration};
use tokio_stream::StreamExt;
use tower_http::trace::TraceLayer;

use crate::{
    bus::ChangeBus,
    codec::{Edge, EdgeTag, Entity, EntityTag, KindCatalog, TypeRegistry},
    config::RelayConfig,
    error::RelayError,
    service::{Ack, GraphService},
    store::{GraphStore, Persist},
};

/// Shared state for the handlers
#[derive(Clone)]
pub struct AppState {
    service: Arc<GraphService>,
    keep_alive: Duration,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[RelayError] {}", self);
        } else {
            tracing::debug!("[RelayError] {} {}", status, self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Router over `service`. Idle event streams get a keep-alive comment every `keep_alive`.
pub fn router(service: Arc<GraphService>, keep_alive: Duration) -> Router {
    let router = Router::new()
        .route("/events", get(events))
        .route("/kinds", get(kinds));
    let router = record_routes::<Entity>(router);
    let router = record_routes::<Edge>(router);
    let router = record_routes::<EntityTag>(router);
    let router = record_routes::<EdgeTag>(router);

    router
        .layer(TraceLayer::new_for_http())
        .with_state(AppState {
            service,
            keep_alive,
        })
}

fn record_routes<E: Persist>(router: Router<AppState>) -> Router<AppState> {
    let kind = E::RECORD.path();
    router
        .route(&format!("/{kind}"), post(create::<E>))
        .route(
            &format!("/{kind}/:id"),
            get(fetch::<E>).put(update::<E>).delete(remove::<E>),
        )
        .route(&format!("/emit/{kind}"), post(emit::<E>))
}

async fn create<E: Persist>(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Ack>, RelayError> {
    state.service.create::<E>(&body).await.map(Json)
}

async fn fetch<E: Persist>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<E>, RelayError> {
    state.service.get::<E>(&id).await.map(Json)
}

async fn update<E: Persist>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Ack>, RelayError> {
    state.service.update::<E>(&id, &body).await.map(Json)
}

async fn remove<E: Persist>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, RelayError> {
    state.service.delete::<E>(&id).await.map(Json)
}

async fn emit<E: Persist>(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Ack>, RelayError> {
    state.service.emit::<E>(&body).await.map(Json)
}

async fn kinds(State(state): State<AppState>) -> Json<KindCatalog> {
    Json(state.service.registry().catalog())
}

/// SSE endpoint handler. The subscription lives as long as the response body; a client
/// disconnect drops it, which unsubscribes.
async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let subscription = state.service.bus().subscribe();
    tracing::debug!("[events] stream opened for subscriber {}", subscription.id());

    let stream = subscription.map(|event| {
        Ok::<_, Infallible>(
            Event::default()
                .event(event.kind.to_string())
                .data(event.data.as_ref()),
        )
    });

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive)),
    )
}

/// Run the service on `config.bind` until `shutdown_signal` resolves.
///
/// Open event streams are closed before the server drains, so connected clients see their
/// stream end instead of holding shutdown open.
pub async fn serve(
    config: &RelayConfig,
    store: Arc<dyn GraphStore>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), RelayError> {
    config.validate()?;
    let bus = ChangeBus::new(config.subscriber_queue);
    let service = Arc::new(GraphService::new(
        Arc::new(TypeRegistry::standard()),
        store,
        bus.clone(),
    ));
    let app = router(service, config.keep_alive());

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("[serve] listening on http://{}", listener.local_addr()?);

    let wrapped_shutdown = async move {
        shutdown_signal.await;
        tracing::info!("[serve] shutting down, closing {} event streams", bus.subscriber_count());
        bus.close_all();
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(wrapped_shutdown)
        .await?;

    tracing::info!("[serve] shut down");
    Ok(())
}
