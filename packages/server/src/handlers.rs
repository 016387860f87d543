//! HTTP handler functions for the crash map API.

use actix_web::{HttpResponse, web};
use crash_map_analytics::summarize_cluster;
use crash_map_crash_models::CrashQuery;
use crash_map_hotspot::{
    DEFAULT_CELL_SIZE_KM, DEFAULT_RADIUS_KM, GridHotspot, Hotspot, NeighborHotspot,
};
use crash_map_server_models::{ApiHealth, ApiHotspot, CrashQueryParams, InvalidFilter};
use crash_map_store::CrashStore;

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let store = state.store.read().await;
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        ready: store.is_ready(),
        records: store.len(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/years`
///
/// Distinct years in the loaded data, ascending.
pub async fn years(state: web::Data<AppState>) -> HttpResponse {
    let store = state.store.read().await;
    HttpResponse::Ok().json(store.years())
}

/// `GET /api/crashes`
///
/// Filtered crashes as a `GeoJSON` point collection. With
/// `speedRelated=true` only speed-related crashes are included.
pub async fn crashes(
    state: web::Data<AppState>,
    params: web::Query<CrashQueryParams>,
) -> HttpResponse {
    let query = match params.to_query() {
        Ok(query) => query,
        Err(e) => return bad_request(&e),
    };

    let store = state.store.read().await;
    if params.speed_related {
        HttpResponse::Ok().json(store.speed_related_geojson(&query))
    } else {
        HttpResponse::Ok().json(store.to_geojson(&query))
    }
}

/// `GET /api/stats`
pub async fn stats(
    state: web::Data<AppState>,
    params: web::Query<CrashQueryParams>,
) -> HttpResponse {
    let query = match params.to_query() {
        Ok(query) => query,
        Err(e) => return bad_request(&e),
    };

    let store = state.store.read().await;
    HttpResponse::Ok().json(store.statistics(&query))
}

/// `GET /api/hotspots/grid`
///
/// Grid hotspots of the filtered crashes, densest first.
pub async fn grid_hotspots(
    state: web::Data<AppState>,
    params: web::Query<CrashQueryParams>,
) -> HttpResponse {
    let query = match params.to_query() {
        Ok(query) => query,
        Err(e) => return bad_request(&e),
    };
    let cell_size_km = params.cell_size_km.unwrap_or(DEFAULT_CELL_SIZE_KM);

    let store = state.store.read().await;
    let hotspots = ranked_grid_hotspots(&store, &query, cell_size_km);
    HttpResponse::Ok().json(hotspot_views(&hotspots))
}

/// `GET /api/hotspots/overview`
///
/// Neighbor hotspots of the filtered crashes, largest first.
pub async fn overview_hotspots(
    state: web::Data<AppState>,
    params: web::Query<CrashQueryParams>,
) -> HttpResponse {
    let query = match params.to_query() {
        Ok(query) => query,
        Err(e) => return bad_request(&e),
    };
    let radius_km = params.radius_km.unwrap_or(DEFAULT_RADIUS_KM);

    let store = state.store.read().await;
    let hotspots = sorted_overview_hotspots(&store, &query, radius_km);
    HttpResponse::Ok().json(hotspot_views(&hotspots))
}

/// `GET /api/hotspots/overview/geojson`
///
/// Outlines of the neighbor hotspots as `GeoJSON` polygons.
pub async fn overview_outlines(
    state: web::Data<AppState>,
    params: web::Query<CrashQueryParams>,
) -> HttpResponse {
    let query = match params.to_query() {
        Ok(query) => query,
        Err(e) => return bad_request(&e),
    };
    let radius_km = params.radius_km.unwrap_or(DEFAULT_RADIUS_KM);

    let store = state.store.read().await;
    let hotspots = sorted_overview_hotspots(&store, &query, radius_km);
    HttpResponse::Ok().json(crash_map_hotspot::outlines(&hotspots))
}

/// `POST /api/reload`
///
/// Reloads every source. On failure the previous data keeps being served.
pub async fn reload(state: web::Data<AppState>) -> HttpResponse {
    match state.reload().await {
        Ok(loaded) => HttpResponse::Ok().json(loaded),
        Err(e) => {
            log::error!("Failed to reload crash sources: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to reload crash sources"
            }))
        }
    }
}

fn bad_request(err: &InvalidFilter) -> HttpResponse {
    log::debug!("Rejected query: {err}");
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": err.to_string()
    }))
}

fn ranked_grid_hotspots<'a>(
    store: &'a CrashStore,
    query: &CrashQuery,
    cell_size_km: f64,
) -> Vec<GridHotspot<'a>> {
    let mut hotspots = crash_map_hotspot::detect_grid_hotspots(store.query(query), cell_size_km);
    crash_map_hotspot::rank_by_density(&mut hotspots);
    hotspots
}

fn sorted_overview_hotspots<'a>(
    store: &'a CrashStore,
    query: &CrashQuery,
    radius_km: f64,
) -> Vec<NeighborHotspot<'a>> {
    let mut hotspots = crash_map_hotspot::detect_neighbor_hotspots(store.query(query), radius_km);
    crash_map_hotspot::sort_by_size(&mut hotspots);
    hotspots
}

fn hotspot_views<H: Hotspot>(hotspots: &[H]) -> Vec<ApiHotspot<'_, H>> {
    hotspots
        .iter()
        .map(|h| ApiHotspot::new(h, summarize_cluster(h.points())))
        .collect()
}
