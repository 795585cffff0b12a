use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::AppConfig;
use crate::entity::user;
use crate::error::AppError;
use crate::password::hash_password;
use crate::routes::favorite::{to_favorite_dto, FavoriteDto};
use crate::store::favorite::FavoriteManager;
use crate::store::user::{NewUser, UserRepository};

const SUBSCRIPTION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const BIRTHDATE_FORMAT: &str = "%Y-%m-%d";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_users))
            .route(web::post().to(create_user)),
    )
    .service(web::resource("/favorites/{user_id}").route(web::get().to(list_user_favorites)))
    .service(
        web::resource("/{id}")
            .route(web::get().to(get_user))
            .route(web::put().to(update_user))
            .route(web::delete().to(delete_user)),
    );
}

#[derive(Deserialize)]
struct UserForm {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    is_active: Option<bool>,
    subscription_date: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    birthdate: Option<String>,
}

#[derive(Serialize)]
struct UserDto {
    id: i32,
    username: String,
    email: String,
    is_active: bool,
    subscription_date: String,
    first_name: String,
    last_name: String,
    birthdate: Option<String>,
}

impl UserForm {
    fn validate(self, bcrypt_cost: u32) -> Result<NewUser, AppError> {
        let username = required("username", self.username)?;
        let email = required("email", self.email)?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| missing("password"))?;
        let is_active = self.is_active.ok_or_else(|| missing("is_active"))?;
        let subscription_date = required("subscription_date", self.subscription_date)?;
        let first_name = required("first_name", self.first_name)?;
        let last_name = required("last_name", self.last_name)?;

        let subscription_date = NaiveDateTime::parse_from_str(subscription_date.trim(), SUBSCRIPTION_DATE_FORMAT)
            .map_err(|_| AppError::param_error("Invalid subscription date format. Use YYYY-MM-DD HH:MM:SS"))?;
        let birthdate = match self.birthdate.filter(|b| !b.trim().is_empty()) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw.trim(), BIRTHDATE_FORMAT)
                    .map_err(|_| AppError::param_error("Invalid birthdate format. Use YYYY-MM-DD"))?,
            ),
            None => None,
        };

        Ok(NewUser {
            username,
            email,
            password_hash: hash_password(&password, bcrypt_cost)?,
            is_active,
            subscription_date,
            first_name,
            last_name,
            birthdate,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| missing(field))
}

fn missing(field: &str) -> AppError {
    let mut chars = field.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    AppError::param_error(format!("{} is required", capitalized))
}

async fn list_users(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let users = UserRepository::new(db.get_ref()).list().await?;
    if users.is_empty() {
        return Err(AppError::not_found("users", "No users found"));
    }
    let list: Vec<UserDto> = users.into_iter().map(to_user_dto).collect();
    Ok(HttpResponse::Ok().json(json!({ "users": list })))
}

async fn get_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user = UserRepository::new(db.get_ref()).get(*path).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": to_user_dto(user) })))
}

async fn create_user(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    payload: web::Json<UserForm>,
) -> Result<HttpResponse, AppError> {
    let new_user = payload.into_inner().validate(config.bcrypt_cost)?;
    let created = UserRepository::new(db.get_ref()).create(new_user).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": "User created successfully",
        "user": to_user_dto(created),
    })))
}

async fn update_user(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<i32>,
    payload: web::Json<UserForm>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let fields = payload.into_inner().validate(config.bcrypt_cost)?;
    let updated = UserRepository::new(db.get_ref()).update(user_id, fields).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": format!("User with ID {} updated successfully", user_id),
        "user": to_user_dto(updated),
    })))
}

async fn delete_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    UserRepository::new(db.get_ref()).delete(user_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": format!("User with ID {} deleted successfully", user_id),
    })))
}

async fn list_user_favorites(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let favorites = FavoriteManager::new(db.get_ref())
        .list_favorites_for_user(path.into_inner())
        .await?;
    let list: Vec<FavoriteDto> = favorites.iter().map(to_favorite_dto).collect();
    Ok(HttpResponse::Ok().json(json!({ "favorites": list })))
}

fn to_user_dto(model: user::Model) -> UserDto {
    UserDto {
        id: model.id,
        username: model.username,
        email: model.email,
        is_active: model.is_active,
        subscription_date: model.subscription_date.format(SUBSCRIPTION_DATE_FORMAT).to_string(),
        first_name: model.first_name,
        last_name: model.last_name,
        birthdate: model.birthdate.map(|d| d.format(BIRTHDATE_FORMAT).to_string()),
    }
}
