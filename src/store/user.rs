use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
    QueryTrait, Set, Statement, TransactionTrait,
};

use crate::entity::user;
use crate::error::{map_tx_error, AppError};
use crate::store::favorite::FavoriteRepository;

#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub subscription_date: NaiveDateTime,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
}

impl NewUser {
    fn into_active_model(self) -> user::ActiveModel {
        user::ActiveModel {
            username: Set(self.username),
            email: Set(self.email),
            password_hash: Set(self.password_hash),
            is_active: Set(self.is_active),
            subscription_date: Set(self.subscription_date),
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            birthdate: Set(self.birthdate),
            ..Default::default()
        }
    }
}

pub fn user_not_found(user_id: i32) -> AppError {
    AppError::not_found("user", format!("User with ID {} not found", user_id))
}

fn locking_select(user_id: i32, lock: LockType, backend: DbBackend) -> Statement {
    user::Entity::find_by_id(user_id).lock(lock).build(backend)
}

pub struct UserRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn exists(&self, user_id: i32) -> Result<bool, AppError> {
        let count = user::Entity::find_by_id(user_id).count(self.db).await?;
        Ok(count > 0)
    }

    pub async fn lock_row(&self, user_id: i32, lock: LockType) -> Result<bool, AppError> {
        let stmt = locking_select(user_id, lock, self.db.get_database_backend());
        Ok(self.db.query_one(stmt).await?.is_some())
    }

    pub async fn get(&self, user_id: i32) -> Result<user::Model, AppError> {
        user::Entity::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    pub async fn list(&self) -> Result<Vec<user::Model>, AppError> {
        let users = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(self.db)
            .await?;
        Ok(users)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<user::Model, AppError> {
        let inserted = new_user.into_active_model().insert(self.db).await?;
        info!("user created id={} username={}", inserted.id, inserted.username);
        Ok(inserted)
    }
}

impl<'a, C: ConnectionTrait + TransactionTrait> UserRepository<'a, C> {
    pub async fn update(&self, user_id: i32, fields: NewUser) -> Result<user::Model, AppError> {
        self.db
            .transaction::<_, user::Model, AppError>(move |txn| {
                Box::pin(async move {
                    if !UserRepository::new(txn).exists(user_id).await? {
                        return Err(user_not_found(user_id));
                    }
                    let mut active = fields.into_active_model();
                    active.id = Set(user_id);
                    let updated = active.update(txn).await?;
                    debug!("user updated id={}", updated.id);
                    Ok(updated)
                })
            })
            .await
            .map_err(map_tx_error)
    }

    pub async fn delete(&self, user_id: i32) -> Result<(), AppError> {
        self.db
            .transaction::<_, (), AppError>(move |txn| {
                Box::pin(async move {
                    if !UserRepository::new(txn).lock_row(user_id, LockType::Update).await? {
                        return Err(user_not_found(user_id));
                    }
                    let removed = FavoriteRepository::new(txn).remove_for_user(user_id).await?;
                    user::Entity::delete_by_id(user_id).exec(txn).await?;
                    info!("user deleted id={} favorites_removed={}", user_id, removed);
                    Ok(())
                })
            })
            .await
            .map_err(map_tx_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::store::fixtures::{luke, new_user};

    #[actix_rt::test]
    async fn creates_and_reads_back_user() {
        let db = test_db().await;
        let repo = UserRepository::new(&db);

        let created = repo.create(luke()).await.unwrap();
        let fetched = repo.get(created.id).await.unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.username, "luke99");
        assert!(repo.exists(created.id).await.unwrap());
    }

    #[actix_rt::test]
    async fn get_missing_user_is_not_found() {
        let db = test_db().await;
        let err = UserRepository::new(&db).get(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { resource: "user", .. }));
        assert_eq!(err.to_string(), "User with ID 42 not found");
    }

    #[actix_rt::test]
    async fn duplicate_username_is_conflict() {
        let db = test_db().await;
        let repo = UserRepository::new(&db);
        repo.create(luke()).await.unwrap();

        let mut clash = new_user("luke99");
        clash.email = "other@x.com".to_string();
        let err = repo.create(clash).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let mut clash = new_user("leia");
        clash.email = "luke@x.com".to_string();
        let err = repo.create(clash).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[actix_rt::test]
    async fn update_replaces_fields() {
        let db = test_db().await;
        let repo = UserRepository::new(&db);
        let created = repo.create(luke()).await.unwrap();

        let mut replacement = new_user("skywalker");
        replacement.is_active = false;
        replacement.birthdate = None;
        let updated = repo.update(created.id, replacement).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.username, "skywalker");
        assert!(!updated.is_active);
        assert_eq!(updated.birthdate, None);
    }

    #[actix_rt::test]
    async fn update_missing_user_is_not_found() {
        let db = test_db().await;
        let err = UserRepository::new(&db).update(7, luke()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { resource: "user", .. }));
    }

    #[actix_rt::test]
    async fn delete_missing_user_is_not_found() {
        let db = test_db().await;
        let err = UserRepository::new(&db).delete(7).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { resource: "user", .. }));
    }

    #[actix_rt::test]
    async fn delete_locks_then_removes_user() {
        let db = test_db().await;
        let repo = UserRepository::new(&db);
        let created = repo.create(luke()).await.unwrap();

        assert!(repo.lock_row(created.id, LockType::Share).await.unwrap());
        repo.delete(created.id).await.unwrap();
        assert!(!repo.lock_row(created.id, LockType::Share).await.unwrap());

        let stmt = locking_select(created.id, LockType::Update, DbBackend::Postgres);
        assert!(stmt.sql.contains("FOR UPDATE"), "{}", stmt.sql);
    }
}
