use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use url::form_urlencoded;
use validator::Validate;

use crate::{
    errors::{AppError, Result},
    ingest,
    models::{ApiResponse, Card, CardPage, LoadSummary},
    query::{link_base, paginate, FilterSpec, PageRequest},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cards", get(list_cards).post(add_card))
        .route("/cards/", get(list_cards))
        .route("/cards/filter", get(filter_cards))
        .route("/cards/filter/", get(filter_cards))
        .route("/cards/load", get(load_cards))
        .route("/cards/:id", get(get_card))
}

/// Split a raw query string into filter values and a clamped page request.
/// Unparsable `page` / `query_size` values fall back to their defaults.
pub fn parse_listing_query(query: &str) -> (FilterSpec, PageRequest) {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    let get_i64 = |key: &str| -> Option<i64> {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.trim().parse().ok())
    };

    let page = PageRequest::clamped(get_i64("page"), get_i64("query_size"));
    let spec = FilterSpec::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.clone())));

    (spec, page)
}

/// GET /cards/ - unfiltered listing
///
/// Parameters:
/// - page: 1-based page number (default: 1)
/// - query_size: cards per page (default: 20, max: 20)
pub async fn list_cards(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ApiResponse<CardPage>>> {
    let (_, page) = parse_listing_query(query.as_deref().unwrap_or(""));

    tracing::info!("📚 LIST REQUEST: page={}, query_size={}", page.page, page.page_size);

    let result = fetch_page(&state, &FilterSpec::new(), page, "/cards/").await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// GET /cards/filter/ - filtered listing
///
/// Accepts any of card_name, card_level, archetype, attribute, card_type, race,
/// linkval, linkmarkers, card_scale, atk, def together with page / query_size.
pub async fn filter_cards(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    let (spec, page) = parse_listing_query(query.as_deref().unwrap_or(""));

    if spec.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": StatusCode::BAD_REQUEST.as_u16(),
                "message": "No filters applied"
            })),
        )
            .into_response());
    }

    tracing::info!(
        "🔍 FILTER REQUEST: page={}, query_size={}, filters={:?}",
        page.page,
        page.page_size,
        spec
    );

    let result = fetch_page(&state, &spec, page, "/cards/filter/").await?;
    Ok(Json(ApiResponse::ok(result)).into_response())
}

async fn fetch_page(
    state: &AppState,
    spec: &FilterSpec,
    page: PageRequest,
    path: &str,
) -> Result<CardPage> {
    let count_start = std::time::Instant::now();
    let (total, url_fragment) = state.repo.get_count(spec).await?;
    tracing::info!("⏱️  COUNT QUERY: {}ms (total={})", count_start.elapsed().as_millis(), total);

    let list_start = std::time::Instant::now();
    let cards = state.repo.get_cards(spec, page).await?;
    tracing::info!(
        "⏱️  LIST QUERY: {}ms (returned {} cards)",
        list_start.elapsed().as_millis(),
        cards.len()
    );

    let meta = paginate(total, page.page, page.page_size, &link_base(path, &url_fragment));

    Ok(CardPage { cards, meta })
}

/// GET /cards/:id
pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Card>>> {
    let id: i32 = id
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid card id: {}", id)))?;

    let card = state.repo.get_card_by_id(id).await?;
    Ok(Json(ApiResponse::ok(card)))
}

/// POST /cards - insert a card and its images
pub async fn add_card(
    State(state): State<AppState>,
    Json(card): Json<Card>,
) -> Result<(StatusCode, Json<ApiResponse<Card>>)> {
    card.validate()
        .map_err(|e| AppError::BadRequest(format!("Validation error: {}", e)))?;

    if !card.has_known_link_markers() {
        tracing::warn!("⚠️ Card {} carries unknown link markers: {:?}", card.id, card.linkmarkers);
    }

    state.repo.add_card(&card).await?;
    tracing::info!("✅ CARD ADDED: id={}, images={}", card.id, card.card_images.len());

    Ok((StatusCode::CREATED, Json(ApiResponse::created(card))))
}

/// GET /cards/load - bulk load from the configured card source
pub async fn load_cards(State(state): State<AppState>) -> Result<Json<ApiResponse<LoadSummary>>> {
    let dump = ingest::load_source(&state.config.card_source).await?;
    tracing::info!("📦 LOAD REQUEST: {} cards in source", dump.data.len());

    let summary = ingest::ingest_cards(&state.repo, &dump.data).await?;
    Ok(Json(ApiResponse::ok(summary)))
}
