use actix_web::{web, Responder};

use crate::api::{profile_required, with_snapshot, ApiState, ProfileQuery};
use crate::report::ReportGenerator;

/// Security group findings report as `{columns, rows}`
pub async fn get_sg_report(
    state: web::Data<ApiState>,
    query: web::Query<ProfileQuery>,
) -> impl Responder {
    let Some(profile) = state.resolve_profile(query.profile.as_deref()) else {
        return profile_required();
    };

    with_snapshot(&state, profile, |snapshot| {
        Ok(ReportGenerator::new(snapshot).findings_report())
    })
    .await
}

/// Findings report packaged as a single-sheet workbook for the exporter
pub async fn get_sg_report_workbook(
    state: web::Data<ApiState>,
    query: web::Query<ProfileQuery>,
) -> impl Responder {
    let Some(profile) = state.resolve_profile(query.profile.as_deref()) else {
        return profile_required();
    };

    with_snapshot(&state, profile, |snapshot| {
        let workbook = ReportGenerator::new(snapshot).findings_workbook();
        Ok(serde_json::json!({
            "file_name": workbook.file_name("sg_findings"),
            "workbook": workbook,
        }))
    })
    .await
}

/// Detail workbook: set summary, rule relation and resource-centric sheets
pub async fn get_sg_detail(
    state: web::Data<ApiState>,
    query: web::Query<ProfileQuery>,
) -> impl Responder {
    let Some(profile) = state.resolve_profile(query.profile.as_deref()) else {
        return profile_required();
    };

    with_snapshot(&state, profile, |snapshot| {
        let workbook = ReportGenerator::new(snapshot).detail_workbook();
        Ok(serde_json::json!({
            "file_name": workbook.file_name("sg_detail_inventory"),
            "collection": snapshot.collection,
            "workbook": workbook,
        }))
    })
    .await
}
