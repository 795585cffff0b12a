mod config;
mod db;
mod entity;
mod error;
mod password;
mod response;
mod routes;
mod store;

use actix_web::{middleware, web, App, HttpServer};
use config::AppConfig;
use db::connect_db;
use log::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env();
    let db = connect_db(&config).await.map_err(|e| {
        error!("db connect failed: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let server_port = config.server_port;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(db.clone()))
            .wrap(middleware::NormalizePath::trim())
            .wrap(middleware::Logger::default())
            .wrap(middleware::from_fn(routes::cors::cors_handler))
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", server_port))?;
    info!("server started at http://0.0.0.0:{}", server_port);
    server.run().await
}
