use crate::catalog::Catalog;
use crate::core::{has_valid_results, rank, score_venue};
use crate::models::{
    AnnotateRequest, AnnotateResponse, ErrorResponse, HealthResponse, RecommendationsResponse,
    SearchRequest, SearchResponse,
};
use crate::services::AnnotationScheduler;
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub scheduler: Arc<AnnotationScheduler>,
}

/// Configure all search-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/search", web::post().to(search))
        .route("/recommendations", web::post().to(recommendations))
        .route("/annotate", web::post().to(annotate_card));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = if state.catalog.is_empty() {
        "degraded"
    } else {
        "healthy"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Score and rank the catalog
///
/// POST /api/v1/search
///
/// Returns the full scored list, hard misses included; the presentation
/// layer decides what to render. No annotations are produced here.
async fn search(state: web::Data<AppState>, req: web::Json<SearchRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let preferences = req.into_inner().into_preferences();

    tracing::info!(
        "Searching catalog for location {:?}: {} must-have, {} nice-to-have tags",
        preferences.location,
        preferences.must_have_tags.len(),
        preferences.nice_to_have_tags.len()
    );

    let results = rank(&state.catalog, &preferences);
    let valid = has_valid_results(&results);

    HttpResponse::Ok().json(SearchResponse {
        results,
        has_valid_results: valid,
        total_venues: state.catalog.len(),
    })
}

/// Full pipeline: rank, then annotate every valid result
///
/// POST /api/v1/recommendations
///
/// Annotation tasks run concurrently with staggered starts under a fresh
/// search generation; a newer call supersedes the annotations of this one.
async fn recommendations(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for recommendations request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let preferences = req.into_inner().into_preferences();
    let results = rank(&state.catalog, &preferences);
    let valid = has_valid_results(&results);

    let ticket = state.scheduler.begin_search();
    tracing::info!(
        "Annotating recommendations for location {:?} under generation {}",
        preferences.location,
        ticket.generation()
    );

    let results = state
        .scheduler
        .annotate_ranked(results, &preferences, &ticket)
        .await;

    HttpResponse::Ok().json(RecommendationsResponse {
        results,
        has_valid_results: valid,
        generation: ticket.generation(),
    })
}

/// Annotate a single displayed card
///
/// POST /api/v1/annotate
///
/// The stagger delay for this path is owned by the remote caller, so the
/// request fires immediately. A hard miss resolves to a null annotation.
async fn annotate_card(
    state: web::Data<AppState>,
    req: web::Json<AnnotateRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for annotate request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();
    let venue = match state.catalog.get(&req.venue_id) {
        Some(venue) => venue.clone(),
        None => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Venue not found".to_string(),
                message: format!("No venue with id {}", req.venue_id),
                status_code: 404,
            });
        }
    };

    let display_rank = req.rank;
    let venue_id = req.venue_id.clone();
    let preferences = req.preferences.into_preferences();
    let result = score_venue(&venue, &preferences);

    if result.is_hard_miss() {
        tracing::debug!("Skipping annotation for hard miss {}", venue_id);
        return HttpResponse::Ok().json(AnnotateResponse {
            venue_id,
            rank: display_rank,
            annotation: None,
        });
    }

    let annotation = state.scheduler.client().annotate(&result, &preferences).await;

    HttpResponse::Ok().json(AnnotateResponse {
        venue_id,
        rank: display_rank,
        annotation: Some(annotation),
    })
}
