use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::routes::to_rfc3339;
use crate::store::favorite::{Favorite, FavoriteManager, FavoriteTarget};
use crate::store::EntityKind;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{kind}/{user_id}/{target_id}")
            .route(web::post().to(add_favorite))
            .route(web::delete().to(remove_favorite)),
    );
}

#[derive(Deserialize)]
struct FavoritePath {
    kind: String,
    user_id: i32,
    target_id: i32,
}

impl FavoritePath {
    fn target(&self) -> Result<FavoriteTarget, AppError> {
        let kind = EntityKind::from_collection(&self.kind)
            .ok_or_else(|| AppError::not_found("resource", "Resource not found"))?;
        Ok(FavoriteTarget {
            kind,
            id: self.target_id,
        })
    }
}

#[derive(Serialize)]
pub struct FavoriteDto {
    id: i32,
    user_id: i32,
    kind: &'static str,
    target_id: i32,
    character_id: Option<i32>,
    planet_id: Option<i32>,
    species_id: Option<i32>,
    vehicle_id: Option<i32>,
    created: Option<String>,
}

pub fn to_favorite_dto(favorite: &Favorite) -> FavoriteDto {
    FavoriteDto {
        id: favorite.id,
        user_id: favorite.user_id,
        kind: favorite.target.kind.as_str(),
        target_id: favorite.target.id,
        character_id: favorite.target_column(EntityKind::Character),
        planet_id: favorite.target_column(EntityKind::Planet),
        species_id: favorite.target_column(EntityKind::Species),
        vehicle_id: favorite.target_column(EntityKind::Vehicle),
        created: favorite.created.map(to_rfc3339),
    }
}

async fn add_favorite(
    db: web::Data<DatabaseConnection>,
    path: web::Path<FavoritePath>,
) -> Result<HttpResponse, AppError> {
    let target = path.target()?;
    let favorite = FavoriteManager::new(db.get_ref())
        .add_favorite(path.user_id, target)
        .await?;
    Ok(HttpResponse::Created().json(json!({
        "msg": format!(
            "{} with ID {} added to favorites for user with ID {}",
            target.kind.label(),
            target.id,
            path.user_id
        ),
        "favorite": to_favorite_dto(&favorite),
    })))
}

async fn remove_favorite(
    db: web::Data<DatabaseConnection>,
    path: web::Path<FavoritePath>,
) -> Result<HttpResponse, AppError> {
    let target = path.target()?;
    FavoriteManager::new(db.get_ref())
        .remove_favorite(path.user_id, target)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "msg": format!(
            "{} with ID {} deleted from favorites for user with ID {}",
            target.kind.label(),
            target.id,
            path.user_id
        ),
    })))
}
