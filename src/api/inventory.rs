use actix_web::{web, HttpResponse, Responder};
use log::error;

use crate::api::{profile_required, with_snapshot, ApiState, ErrorResponse, ProfileQuery};
use crate::report::{Dataset, ReportGenerator};
use crate::security::templates::SECURITY_GROUPS_KIND;
use crate::security::ResourceType;

/// List the profiles available under the inventory root
pub async fn list_profiles(state: web::Data<ApiState>) -> impl Responder {
    let loader = state.loader.clone();
    let result = web::block(move || loader.list_profiles()).await;

    match result {
        Ok(Ok(profiles)) => HttpResponse::Ok().json(serde_json::json!({
            "profiles": profiles,
            "default_profile": state.default_profile,
        })),
        Ok(Err(e)) => {
            error!("Failed to list profiles: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            })
        }
        Err(e) => {
            error!("Blocking task error: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Failed to list profiles: {}", e),
            })
        }
    }
}

/// Every collected inventory kind of a profile as one workbook
pub async fn get_inventory_workbook(
    state: web::Data<ApiState>,
    query: web::Query<ProfileQuery>,
) -> impl Responder {
    let Some(profile) = state.resolve_profile(query.profile.as_deref()) else {
        return profile_required();
    };

    with_snapshot(&state, profile, |snapshot| {
        let workbook = ReportGenerator::new(snapshot).overall_workbook();
        Ok(serde_json::json!({
            "file_name": workbook.file_name("overall_inventory"),
            "collection": snapshot.collection,
            "workbook": workbook,
        }))
    })
    .await
}

/// Inventory dataset of one kind: expanded rules for security groups,
/// resources of that type otherwise
pub async fn get_resource(
    state: web::Data<ApiState>,
    path: web::Path<String>,
    query: web::Query<ProfileQuery>,
) -> impl Responder {
    let kind = path.into_inner();
    let resource_type = if kind == SECURITY_GROUPS_KIND {
        None
    } else {
        match ResourceType::from_kind(&kind) {
            Some(resource_type) => Some(resource_type),
            None => {
                return HttpResponse::NotFound().json(ErrorResponse {
                    error: "Unsupported resource".to_string(),
                })
            }
        }
    };

    let Some(profile) = state.resolve_profile(query.profile.as_deref()) else {
        return profile_required();
    };

    with_snapshot(&state, profile, move |snapshot| {
        let generator = ReportGenerator::new(snapshot);
        let data = match resource_type {
            Some(resource_type) => generator.resources_dataset(resource_type),
            None => generator.rules_dataset(),
        };
        // Nothing collected: no columns either
        if data.is_empty() {
            return Ok(Dataset::default());
        }
        Ok(data)
    })
    .await
}
