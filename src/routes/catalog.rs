use actix_web::{web, HttpResponse, Scope};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::error::AppError;
use crate::store::catalog::{CatalogFields, CatalogRepository};
use crate::store::EntityKind;

pub fn scope(kind: EntityKind) -> Scope {
    web::scope(&format!("/{}", kind.collection()))
        .app_data(web::Data::new(kind))
        .configure(config)
}

fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list))
            .route(web::post().to(create)),
    )
    .service(
        web::resource("/{id}")
            .route(web::get().to(get))
            .route(web::put().to(update))
            .route(web::delete().to(remove)),
    );
}

async fn list(
    db: web::Data<DatabaseConnection>,
    kind: web::Data<EntityKind>,
) -> Result<HttpResponse, AppError> {
    let kind = **kind;
    let records = CatalogRepository::new(db.get_ref()).list(kind).await?;
    if records.is_empty() {
        return Err(AppError::not_found(
            kind.collection(),
            format!("No {} found", kind.collection()),
        ));
    }
    Ok(HttpResponse::Ok().json(json!({ kind.collection(): records })))
}

async fn get(
    db: web::Data<DatabaseConnection>,
    kind: web::Data<EntityKind>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let kind = **kind;
    let record = CatalogRepository::new(db.get_ref()).get(kind, *path).await?;
    Ok(HttpResponse::Ok().json(json!({ kind.singular_key(): record })))
}

async fn create(
    db: web::Data<DatabaseConnection>,
    kind: web::Data<EntityKind>,
    payload: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    let kind = **kind;
    let fields = CatalogFields::from_json(kind, payload.into_inner())?;
    let record = CatalogRepository::new(db.get_ref()).create(fields).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": format!("{} created successfully", kind.label()),
        kind.singular_key(): record,
    })))
}

async fn update(
    db: web::Data<DatabaseConnection>,
    kind: web::Data<EntityKind>,
    path: web::Path<i32>,
    payload: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    let kind = **kind;
    let id = path.into_inner();
    let fields = CatalogFields::from_json(kind, payload.into_inner())?;
    let record = CatalogRepository::new(db.get_ref()).update(id, fields).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": format!("{} with ID {} updated successfully", kind.label(), id),
        kind.singular_key(): record,
    })))
}

async fn remove(
    db: web::Data<DatabaseConnection>,
    kind: web::Data<EntityKind>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let kind = **kind;
    let id = path.into_inner();
    CatalogRepository::new(db.get_ref()).delete(kind, id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": format!("{} with ID {} deleted successfully", kind.label(), id),
    })))
}
