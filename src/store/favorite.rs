use chrono::{DateTime, Utc};
use log::{debug, error, info};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entity::favorite;
use crate::error::{map_tx_error, AppError};
use crate::store::catalog::{target_not_found, CatalogRepository};
use crate::store::user::{user_not_found, UserRepository};
use crate::store::EntityKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FavoriteTarget {
    pub kind: EntityKind,
    pub id: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Favorite {
    pub id: i32,
    pub user_id: i32,
    pub target: FavoriteTarget,
    pub created: Option<DateTime<Utc>>,
}

impl Favorite {
    pub fn target_column(&self, kind: EntityKind) -> Option<i32> {
        (self.target.kind == kind).then_some(self.target.id)
    }
}

impl TryFrom<favorite::Model> for Favorite {
    type Error = AppError;

    fn try_from(model: favorite::Model) -> Result<Self, Self::Error> {
        let kind = model.fav_type.parse::<EntityKind>().map_err(|e| {
            error!("favorite id={} has unknown fav_type {:?}", model.id, e.0);
            AppError::system_exception()
        })?;
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            target: FavoriteTarget {
                kind,
                id: model.target_id,
            },
            created: model.created,
        })
    }
}

fn favorite_not_found(user_id: i32, target: FavoriteTarget) -> AppError {
    AppError::not_found(
        "favorite",
        format!(
            "{} with ID {} is not a favorite for user with ID {}",
            target.kind.label(),
            target.id,
            user_id
        ),
    )
}

pub struct FavoriteRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> FavoriteRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn insert(&self, user_id: i32, target: FavoriteTarget) -> Result<Favorite, AppError> {
        let active = favorite::ActiveModel {
            user_id: Set(user_id),
            fav_type: Set(target.kind.as_str().to_string()),
            target_id: Set(target.id),
            created: Set(Some(Utc::now())),
            ..Default::default()
        };
        let inserted = active.insert(self.db).await?;
        Favorite::try_from(inserted)
    }

    pub async fn find_for_user(&self, user_id: i32) -> Result<Vec<Favorite>, AppError> {
        favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .order_by_asc(favorite::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Favorite::try_from)
            .collect()
    }

    pub async fn find_first(
        &self,
        user_id: i32,
        target: FavoriteTarget,
    ) -> Result<Option<favorite::Model>, AppError> {
        let row = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::FavType.eq(target.kind.as_str()))
            .filter(favorite::Column::TargetId.eq(target.id))
            .order_by_asc(favorite::Column::Id)
            .one(self.db)
            .await?;
        Ok(row)
    }

    pub async fn remove_for_user(&self, user_id: i32) -> Result<u64, AppError> {
        let result = favorite::Entity::delete_many()
            .filter(favorite::Column::UserId.eq(user_id))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn remove_for_target(&self, target: FavoriteTarget) -> Result<u64, AppError> {
        let result = favorite::Entity::delete_many()
            .filter(favorite::Column::FavType.eq(target.kind.as_str()))
            .filter(favorite::Column::TargetId.eq(target.id))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

pub struct FavoriteManager<'a, C: ConnectionTrait + TransactionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> FavoriteManager<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn add_favorite(&self, user_id: i32, target: FavoriteTarget) -> Result<Favorite, AppError> {
        self.db
            .transaction::<_, Favorite, AppError>(move |txn| {
                Box::pin(async move {
                    // share locks keep both rows alive until the insert commits
                    if !UserRepository::new(txn).lock_row(user_id, LockType::Share).await? {
                        return Err(user_not_found(user_id));
                    }
                    if !CatalogRepository::new(txn)
                        .lock_row(target.kind, target.id, LockType::Share)
                        .await?
                    {
                        return Err(target_not_found(target.kind, target.id));
                    }
                    let favorite = FavoriteRepository::new(txn).insert(user_id, target).await?;
                    info!(
                        "favorite added id={} user_id={} {}={}",
                        favorite.id, user_id, target.kind, target.id
                    );
                    Ok(favorite)
                })
            })
            .await
            .map_err(map_tx_error)
    }

    pub async fn remove_favorite(&self, user_id: i32, target: FavoriteTarget) -> Result<Favorite, AppError> {
        self.db
            .transaction::<_, Favorite, AppError>(move |txn| {
                Box::pin(async move {
                    if !UserRepository::new(txn).exists(user_id).await? {
                        return Err(user_not_found(user_id));
                    }
                    let row = FavoriteRepository::new(txn)
                        .find_first(user_id, target)
                        .await?
                        .ok_or_else(|| favorite_not_found(user_id, target))?;
                    favorite::Entity::delete_by_id(row.id).exec(txn).await?;
                    debug!("favorite removed id={}", row.id);
                    Favorite::try_from(row)
                })
            })
            .await
            .map_err(map_tx_error)
    }

    pub async fn list_favorites_for_user(&self, user_id: i32) -> Result<Vec<Favorite>, AppError> {
        let favorites = FavoriteRepository::new(self.db).find_for_user(user_id).await?;
        if favorites.is_empty() {
            return Err(AppError::not_found("favorite", "No favorites found for this user"));
        }
        Ok(favorites)
    }
}
