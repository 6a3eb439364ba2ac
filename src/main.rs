use actix_web::{web, App, HttpServer};
use log::info;

use minechess_server::routes;
use minechess_server::service::{run_matchmaking, GameManager};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000);

    // Create shared application state
    let manager = web::Data::new(GameManager::new());

    // Start the matchmaking processor
    run_matchmaking(manager.clone().into_inner());

    info!("starting minechess server at http://0.0.0.0:{}", port);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(manager.clone())
            .configure(routes::configure_routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
