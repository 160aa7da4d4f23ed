// HTTP request handlers for API endpoints

use actix_web::{web, HttpResponse, Result};
use std::time::SystemTime;
use tracing::error;

use crate::api::models::*;
use crate::api::ApiState;
use crate::audit;
use crate::normalization::normalise_postcode;
use crate::scanner::ScanTrigger;
use crate::scheduler::TriggerOutcome;
use crate::store::{self, competitions, settings::HOME_POSTCODE_KEY};

fn internal_error(context: &str, err: anyhow::Error) -> HttpResponse {
    error!(context, error = %format!("{err:#}"), "request failed");
    HttpResponse::InternalServerError().json(ApiResponse::<()>::error(context))
}

/// Health check endpoint
pub async fn health_check(state: web::Data<ApiState>) -> Result<HttpResponse> {
    let db_status = match sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(&state.db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let uptime = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Ok(HttpResponse::Ok().json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
        uptime_seconds: uptime,
    })))
}

/// Catalog listing with the standard filters; competitions only unless
/// `is_competition=false` is requested.
pub async fn list_competitions(
    query: web::Query<CompetitionQuery>,
    state: web::Data<ApiState>,
) -> Result<HttpResponse> {
    let filter = query.into_inner().into_filter();
    match competitions::query_catalog(&state.db, &filter).await {
        Ok(rows) => Ok(HttpResponse::Ok().json(ApiResponse::success(rows))),
        Err(err) => Ok(internal_error("catalog query failed", err)),
    }
}

pub async fn get_competition(
    path: web::Path<i64>,
    state: web::Data<ApiState>,
) -> Result<HttpResponse> {
    match competitions::get_competition(&state.db, path.into_inner()).await {
        Ok(Some(row)) => Ok(HttpResponse::Ok().json(ApiResponse::success(row))),
        Ok(None) => {
            Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("competition not found")))
        }
        Err(err) => Ok(internal_error("competition lookup failed", err)),
    }
}

pub async fn get_venue(path: web::Path<i64>, state: web::Data<ApiState>) -> Result<HttpResponse> {
    match store::venues::get_venue(&state.db, path.into_inner()).await {
        Ok(Some(venue)) => Ok(HttpResponse::Ok().json(ApiResponse::success(venue))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("venue not found"))),
        Err(err) => Ok(internal_error("venue lookup failed", err)),
    }
}

pub async fn list_sources(state: web::Data<ApiState>) -> Result<HttpResponse> {
    match store::sources::list_sources(&state.db).await {
        Ok(sources) => Ok(HttpResponse::Ok().json(ApiResponse::success(sources))),
        Err(err) => Ok(internal_error("source listing failed", err)),
    }
}

pub async fn list_scans(
    query: web::Query<ScanQuery>,
    state: web::Data<ApiState>,
) -> Result<HttpResponse> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    match store::scans::list_scans(&state.db, query.source_id, limit).await {
        Ok(scans) => Ok(HttpResponse::Ok().json(ApiResponse::success(scans))),
        Err(err) => Ok(internal_error("scan history query failed", err)),
    }
}

/// Trigger a scan in the background and return immediately. Empty body
/// means every enabled source.
pub async fn trigger_scan(
    payload: Option<web::Json<ScanTriggerRequest>>,
    state: web::Data<ApiState>,
) -> Result<HttpResponse> {
    let source_id = payload.and_then(|p| p.source_id);
    if let Some(id) = source_id {
        match store::sources::get_source(&state.db, id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Ok(
                    HttpResponse::NotFound().json(ApiResponse::<()>::error("source not found"))
                )
            }
            Err(err) => return Ok(internal_error("source lookup failed", err)),
        }
    }
    let outcomes = match state
        .scheduler
        .trigger(source_id, ScanTrigger::Manual)
        .await
    {
        Ok(outcomes) => outcomes,
        Err(err) => return Ok(internal_error("scan trigger failed", err)),
    };

    let mut response = TriggerResponse {
        started: Vec::new(),
        already_running: Vec::new(),
    };
    for outcome in outcomes {
        match outcome {
            TriggerOutcome::Started { source_id, scan_id } => {
                response.started.push(StartedScan { source_id, scan_id })
            }
            TriggerOutcome::AlreadyRunning { source_id } => {
                response.already_running.push(source_id)
            }
        }
    }
    Ok(HttpResponse::Accepted().json(ApiResponse::success(response)))
}

/// Update the home postcode, persist it, and recompute every venue's
/// derived distance.
pub async fn update_home_postcode(
    payload: web::Json<PostcodeUpdateRequest>,
    state: web::Data<ApiState>,
) -> Result<HttpResponse> {
    let Some(postcode) = normalise_postcode(&payload.postcode) else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("invalid postcode")));
    };

    if !state.geocoder.set_home_postcode(&postcode).await {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("postcode could not be geocoded")));
    }

    if let Err(err) =
        store::settings::set_setting(&state.db, HOME_POSTCODE_KEY, &postcode).await
    {
        return Ok(internal_error("persisting home postcode failed", err));
    }

    match audit::recompute_all_distances(&state.db, &state.geocoder).await {
        Ok(distances_updated) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            PostcodeUpdateResponse {
                postcode,
                distances_updated,
            },
        ))),
        Err(err) => Ok(internal_error("distance recompute failed", err)),
    }
}
