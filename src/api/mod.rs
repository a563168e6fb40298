use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::{Deserialize, Serialize};

use crate::ingestion::{IngestionError, InventorySnapshot, SnapshotLoader};

pub mod inventory;
pub mod reports;
pub mod server;

pub struct ApiState {
    pub loader: SnapshotLoader,
    pub default_profile: Option<String>,
}

impl ApiState {
    /// The requested profile, or the configured default
    pub fn resolve_profile(&self, requested: Option<&str>) -> Option<String> {
        requested
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|p| p.to_string())
            .or_else(|| self.default_profile.clone())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub profile: Option<String>,
}

pub(crate) fn profile_required() -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Profile is required".to_string(),
    })
}

/// Load a profile snapshot and build a response body from it on the blocking
/// pool, mapping ingestion failures to HTTP statuses.
pub(crate) async fn with_snapshot<T, F>(
    state: &web::Data<ApiState>,
    profile: String,
    build: F,
) -> HttpResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce(&InventorySnapshot) -> anyhow::Result<T> + Send + 'static,
{
    let loader = state.loader.clone();
    let result = web::block(move || -> anyhow::Result<T> {
        let snapshot = loader.load(&profile)?;
        build(&snapshot)
    })
    .await;

    match result {
        Ok(Ok(body)) => HttpResponse::Ok().json(body),
        Ok(Err(e)) => match e.downcast_ref::<IngestionError>() {
            Some(ingestion) if ingestion.is_not_found() => HttpResponse::NotFound().json(ErrorResponse {
                error: e.to_string(),
            }),
            Some(IngestionError::InvalidProfile(_)) => HttpResponse::BadRequest().json(ErrorResponse {
                error: e.to_string(),
            }),
            _ => {
                error!("Report generation failed: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: e.to_string(),
                })
            }
        },
        Err(e) => {
            error!("Blocking task error: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Failed to execute report: {}", e),
            })
        }
    }
}

// Health check endpoint
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "sg-auditor"
    }))
}
