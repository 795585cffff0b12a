pub mod catalog;
pub mod cors;
pub mod favorite;
pub mod user;

use actix_web::web;
use chrono::SecondsFormat;

use crate::response::{json_error_handler, path_error_handler};
use crate::store::EntityKind;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(web::scope("/users").configure(user::config))
        .service(web::scope("/favorites").configure(favorite::config));
    for kind in EntityKind::ALL {
        cfg.service(catalog::scope(kind));
    }
}

fn to_rfc3339(dt: chrono::DateTime<chrono::Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, false)
}

#[cfg(test)]
#[macro_export]
macro_rules! test_app {
    ($db:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($crate::config::AppConfig::for_tests()))
                .app_data(actix_web::web::Data::new($db.clone()))
                .wrap(actix_web::middleware::NormalizePath::trim())
                .configure($crate::routes::configure),
        )
        .await
    };
}
