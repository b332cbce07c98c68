use modarec::{init_tracing, AppState, Config, Error, InteractionType, Product, Strategy, TaskReport};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    strategy: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct HomepageQuery {
    user_id: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SimilarityModeQuery {
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InteractionRequest {
    user_id: Uuid,
    product_id: Uuid,
    interaction_type: String,
    value: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: String,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}

type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn into_api_error(e: Error) -> ApiError {
    let status = if e.is_invalid_input() {
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!("Request failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ApiResponse::error(e.to_string())))
}

fn parse_limit(limit: Option<usize>) -> Result<usize, ApiError> {
    let limit = limit.unwrap_or(10);
    modarec::utils::validation::validate_limit(limit).map_err(into_api_error)?;
    Ok(limit)
}

async fn health_check() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(serde_json::json!({
        "status": "healthy",
        "service": "modarec",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

async fn get_user_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<RecommendationQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let limit = parse_limit(params.limit)?;
    let strategy = match params.strategy.as_deref() {
        Some(raw) => Strategy::parse(raw).map_err(into_api_error)?,
        None => Strategy::Hybrid,
    };

    let products = match strategy {
        Strategy::UserBased => state.user_based.recommend(user_id, limit).await,
        Strategy::ItemBased => state.item_based.recommend(user_id, limit).await,
        Strategy::Hybrid => state.hybrid.recommend(user_id, limit).await,
    }
    .map_err(into_api_error)?;

    Ok(Json(ApiResponse::success(products)))
}

async fn get_homepage_recommendations(
    State(state): State<AppState>,
    Query(params): Query<HomepageQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let limit = parse_limit(params.limit)?;
    let user_id = params
        .user_id
        .as_deref()
        .map(modarec::utils::validation::validate_uuid_string)
        .transpose()
        .map_err(into_api_error)?;
    let products = state
        .hybrid
        .homepage_recommendations(user_id, limit)
        .await
        .map_err(into_api_error)?;

    Ok(Json(ApiResponse::success(products)))
}

async fn get_similar_products(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let limit = parse_limit(params.limit)?;
    let products = state
        .item_based
        .similar_to(product_id, limit)
        .await
        .map_err(into_api_error)?;

    Ok(Json(ApiResponse::success(products)))
}

async fn get_bought_together(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let limit = parse_limit(params.limit)?;
    let products = state
        .hybrid
        .frequently_bought_together(product_id, limit)
        .await
        .map_err(into_api_error)?;

    Ok(Json(ApiResponse::success(products)))
}

async fn get_also_viewed(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let limit = parse_limit(params.limit)?;
    let products = state
        .hybrid
        .customers_also_viewed(product_id, limit)
        .await
        .map_err(into_api_error)?;

    Ok(Json(ApiResponse::success(products)))
}

async fn record_interaction(
    State(state): State<AppState>,
    Json(request): Json<InteractionRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let interaction_type =
        InteractionType::parse(&request.interaction_type).map_err(into_api_error)?;
    if let Some(value) = request.value {
        if interaction_type == InteractionType::Rating {
            modarec::utils::validation::validate_rating_value(value).map_err(into_api_error)?;
        }
    }

    state
        .hybrid
        .record_interaction(
            request.user_id,
            request.product_id,
            interaction_type,
            request.value,
        )
        .await
        .map_err(into_api_error)?;

    Ok(Json(ApiResponse::success(
        "Interaction recorded successfully".to_string(),
    )))
}

async fn compute_user_similarities(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let rows = state
        .user_based
        .compute_user_similarities(None)
        .await
        .map_err(into_api_error)?;

    Ok(Json(ApiResponse::success(format!(
        "{} user similarity pairs stored",
        rows
    ))))
}

async fn compute_product_similarities(
    State(state): State<AppState>,
    Query(params): Query<SimilarityModeQuery>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let rows = match params.mode.as_deref() {
        None | Some("full") => state.item_based.compute_product_similarities(None).await,
        Some("cooccurrence") => state.item_based.compute_similarities_by_co_occurrence().await,
        Some(other) => Err(Error::UnknownSimilarityMode(other.to_string())),
    }
    .map_err(into_api_error)?;

    Ok(Json(ApiResponse::success(format!(
        "{} product similarity pairs stored",
        rows
    ))))
}

async fn cleanup_expired_cache(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let swept = state
        .hybrid
        .cleanup_expired_cache()
        .await
        .map_err(into_api_error)?;

    Ok(Json(ApiResponse::success(format!(
        "{} expired cache entries removed",
        swept
    ))))
}

async fn compute_all(State(state): State<AppState>) -> Json<ApiResponse<Vec<TaskReport>>> {
    // Per-task outcomes land in the report list; the endpoint itself succeeds.
    Json(ApiResponse::success(state.scheduler.compute_all().await))
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/recommendations/user/:user_id",
            get(get_user_recommendations),
        )
        .route(
            "/api/recommendations/homepage",
            get(get_homepage_recommendations),
        )
        .route("/api/products/:product_id/similar", get(get_similar_products))
        .route(
            "/api/products/:product_id/bought-together",
            get(get_bought_together),
        )
        .route("/api/products/:product_id/also-viewed", get(get_also_viewed))
        .route("/api/interactions", post(record_interaction))
        .route(
            "/api/admin/recommendations/compute-user-similarities",
            post(compute_user_similarities),
        )
        .route(
            "/api/admin/recommendations/compute-product-similarities",
            post(compute_product_similarities),
        )
        .route(
            "/api/admin/recommendations/cleanup-expired-cache",
            post(cleanup_expired_cache),
        )
        .route("/api/admin/recommendations/compute-all", post(compute_all))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match std::env::var("MODAREC_CONFIG") {
        Ok(path) => Config::from_file(&path)?,
        Err(_) => Config::default(),
    };
    info!("Starting modarec server with config: {:?}", config.server);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .enable_all()
        .build()?;
    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(config);
    Arc::clone(&state.scheduler).start();

    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(state.config.server.socket_addr()).await?;
    info!("Server listening on {}", state.config.server.socket_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
