use actix_web::{middleware, web, App, HttpServer};
use log::info;

use crate::api::inventory::{get_inventory_workbook, get_resource, list_profiles};
use crate::api::reports::{get_sg_detail, get_sg_report, get_sg_report_workbook};
use crate::api::{health, ApiState};
use crate::config::Config;
use crate::ingestion::SnapshotLoader;

/// Register every route; shared by the server and the HTTP tests
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api/v1")
            // Inventory endpoints
            .route("/profiles", web::get().to(list_profiles))
            .route("/resources/{kind}", web::get().to(get_resource))
            .route("/inventory/workbook", web::get().to(get_inventory_workbook))
            // Security group report endpoints
            .route("/sg/report", web::get().to(get_sg_report))
            .route("/sg/report/workbook", web::get().to(get_sg_report_workbook))
            .route("/sg/detail", web::get().to(get_sg_detail)),
    );
}

pub async fn start_server(config: Config) -> std::io::Result<()> {
    let api_state = web::Data::new(ApiState {
        loader: SnapshotLoader::new(&config.inventory),
        default_profile: config.inventory.default_profile.clone(),
    });

    info!("Reading inventory snapshots from {}", config.inventory.root_path);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(api_state.clone())
            .configure(configure_routes)
    })
    .bind(format!("{}:{}", config.server.host, config.server.port))?
    .run()
    .await
}
