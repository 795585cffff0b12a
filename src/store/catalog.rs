use log::{debug, info};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
    QueryTrait, Set, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entity::{character, planet, species, vehicle};
use crate::error::{map_tx_error, AppError};
use crate::store::favorite::{FavoriteRepository, FavoriteTarget};
use crate::store::EntityKind;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CharacterFields {
    pub name: Option<String>,
    pub birth_year: Option<i32>,
    pub homeworld: Option<String>,
    pub gender: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub height: Option<i32>,
    pub mass: Option<i32>,
    pub skin_color: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlanetFields {
    pub name: Option<String>,
    pub climate: Option<String>,
    pub population: Option<i64>,
    pub terrain: Option<String>,
    pub diameter: Option<i32>,
    pub surface_water: Option<i32>,
    pub gravity: Option<String>,
    pub rotation_period: Option<i32>,
    pub orbital_period: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SpeciesFields {
    pub name: Option<String>,
    pub classification: Option<String>,
    pub designation: Option<String>,
    pub language: Option<String>,
    pub average_height: Option<i32>,
    pub average_lifespan: Option<i32>,
    pub eye_colors: Option<String>,
    pub hair_colors: Option<String>,
    pub skin_colors: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VehicleFields {
    pub name: Option<String>,
    pub model: Option<String>,
    pub vehicle_class: Option<String>,
    pub consumables: Option<String>,
    pub length: Option<i32>,
    pub max_atmosphering_speed: Option<i32>,
    pub cargo_capacity: Option<i32>,
    pub crew: Option<i32>,
    pub passengers: Option<i32>,
    pub manufacturer: Option<String>,
}

impl CharacterFields {
    fn into_active_model(self, name: String) -> character::ActiveModel {
        character::ActiveModel {
            name: Set(name),
            birth_year: Set(self.birth_year),
            homeworld: Set(self.homeworld),
            gender: Set(self.gender),
            eye_color: Set(self.eye_color),
            hair_color: Set(self.hair_color),
            height: Set(self.height),
            mass: Set(self.mass),
            skin_color: Set(self.skin_color),
            ..Default::default()
        }
    }
}

impl PlanetFields {
    fn into_active_model(self, name: String) -> planet::ActiveModel {
        planet::ActiveModel {
            name: Set(name),
            climate: Set(self.climate),
            population: Set(self.population),
            terrain: Set(self.terrain),
            diameter: Set(self.diameter),
            surface_water: Set(self.surface_water),
            gravity: Set(self.gravity),
            rotation_period: Set(self.rotation_period),
            orbital_period: Set(self.orbital_period),
            ..Default::default()
        }
    }
}

impl SpeciesFields {
    fn into_active_model(self, name: String) -> species::ActiveModel {
        species::ActiveModel {
            name: Set(name),
            classification: Set(self.classification),
            designation: Set(self.designation),
            language: Set(self.language),
            average_height: Set(self.average_height),
            average_lifespan: Set(self.average_lifespan),
            eye_colors: Set(self.eye_colors),
            hair_colors: Set(self.hair_colors),
            skin_colors: Set(self.skin_colors),
            ..Default::default()
        }
    }
}

impl VehicleFields {
    fn into_active_model(self, name: String) -> vehicle::ActiveModel {
        vehicle::ActiveModel {
            name: Set(name),
            model_name: Set(self.model),
            vehicle_class: Set(self.vehicle_class),
            consumables: Set(self.consumables),
            length: Set(self.length),
            max_atmosphering_speed: Set(self.max_atmosphering_speed),
            cargo_capacity: Set(self.cargo_capacity),
            crew: Set(self.crew),
            passengers: Set(self.passengers),
            manufacturer: Set(self.manufacturer),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub enum CatalogFields {
    Character(CharacterFields),
    Planet(PlanetFields),
    Species(SpeciesFields),
    Vehicle(VehicleFields),
}

impl CatalogFields {
    pub fn from_json(kind: EntityKind, value: serde_json::Value) -> Result<Self, AppError> {
        let parsed = match kind {
            EntityKind::Character => serde_json::from_value(value).map(Self::Character),
            EntityKind::Planet => serde_json::from_value(value).map(Self::Planet),
            EntityKind::Species => serde_json::from_value(value).map(Self::Species),
            EntityKind::Vehicle => serde_json::from_value(value).map(Self::Vehicle),
        };
        parsed.map_err(|e| AppError::param_error_with("Invalid request body", e.to_string()))
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Character(_) => EntityKind::Character,
            Self::Planet(_) => EntityKind::Planet,
            Self::Species(_) => EntityKind::Species,
            Self::Vehicle(_) => EntityKind::Vehicle,
        }
    }

    fn required_name(&self) -> Result<String, AppError> {
        let name = match self {
            Self::Character(f) => f.name.as_deref(),
            Self::Planet(f) => f.name.as_deref(),
            Self::Species(f) => f.name.as_deref(),
            Self::Vehicle(f) => f.name.as_deref(),
        };
        name.filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::param_error("Name is required"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CatalogRecord {
    Character(character::Model),
    Planet(planet::Model),
    Species(species::Model),
    Vehicle(vehicle::Model),
}

impl CatalogRecord {
    pub fn id(&self) -> i32 {
        match self {
            Self::Character(m) => m.id,
            Self::Planet(m) => m.id,
            Self::Species(m) => m.id,
            Self::Vehicle(m) => m.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Character(_) => EntityKind::Character,
            Self::Planet(_) => EntityKind::Planet,
            Self::Species(_) => EntityKind::Species,
            Self::Vehicle(_) => EntityKind::Vehicle,
        }
    }
}

pub fn target_not_found(kind: EntityKind, id: i32) -> AppError {
    AppError::not_found(kind.as_str(), format!("{} with ID {} not found", kind.label(), id))
}

// the SQLite builder omits the lock clause
fn locking_select(kind: EntityKind, id: i32, lock: LockType, backend: DbBackend) -> Statement {
    match kind {
        EntityKind::Character => character::Entity::find_by_id(id).lock(lock).build(backend),
        EntityKind::Planet => planet::Entity::find_by_id(id).lock(lock).build(backend),
        EntityKind::Species => species::Entity::find_by_id(id).lock(lock).build(backend),
        EntityKind::Vehicle => vehicle::Entity::find_by_id(id).lock(lock).build(backend),
    }
}

pub struct CatalogRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> CatalogRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn exists(&self, kind: EntityKind, id: i32) -> Result<bool, AppError> {
        let count = match kind {
            EntityKind::Character => character::Entity::find_by_id(id).count(self.db).await?,
            EntityKind::Planet => planet::Entity::find_by_id(id).count(self.db).await?,
            EntityKind::Species => species::Entity::find_by_id(id).count(self.db).await?,
            EntityKind::Vehicle => vehicle::Entity::find_by_id(id).count(self.db).await?,
        };
        Ok(count > 0)
    }

    pub async fn lock_row(&self, kind: EntityKind, id: i32, lock: LockType) -> Result<bool, AppError> {
        let stmt = locking_select(kind, id, lock, self.db.get_database_backend());
        Ok(self.db.query_one(stmt).await?.is_some())
    }

    pub async fn get(&self, kind: EntityKind, id: i32) -> Result<CatalogRecord, AppError> {
        let record = match kind {
            EntityKind::Character => character::Entity::find_by_id(id)
                .one(self.db)
                .await?
                .map(CatalogRecord::Character),
            EntityKind::Planet => planet::Entity::find_by_id(id)
                .one(self.db)
                .await?
                .map(CatalogRecord::Planet),
            EntityKind::Species => species::Entity::find_by_id(id)
                .one(self.db)
                .await?
                .map(CatalogRecord::Species),
            EntityKind::Vehicle => vehicle::Entity::find_by_id(id)
                .one(self.db)
                .await?
                .map(CatalogRecord::Vehicle),
        };
        record.ok_or_else(|| target_not_found(kind, id))
    }

    pub async fn list(&self, kind: EntityKind) -> Result<Vec<CatalogRecord>, AppError> {
        let records = match kind {
            EntityKind::Character => character::Entity::find()
                .order_by_asc(character::Column::Id)
                .all(self.db)
                .await?
                .into_iter()
                .map(CatalogRecord::Character)
                .collect(),
            EntityKind::Planet => planet::Entity::find()
                .order_by_asc(planet::Column::Id)
                .all(self.db)
                .await?
                .into_iter()
                .map(CatalogRecord::Planet)
                .collect(),
            EntityKind::Species => species::Entity::find()
                .order_by_asc(species::Column::Id)
                .all(self.db)
                .await?
                .into_iter()
                .map(CatalogRecord::Species)
                .collect(),
            EntityKind::Vehicle => vehicle::Entity::find()
                .order_by_asc(vehicle::Column::Id)
                .all(self.db)
                .await?
                .into_iter()
                .map(CatalogRecord::Vehicle)
                .collect(),
        };
        Ok(records)
    }

    pub async fn create(&self, fields: CatalogFields) -> Result<CatalogRecord, AppError> {
        let name = fields.required_name()?;
        let record = match fields {
            CatalogFields::Character(f) => {
                CatalogRecord::Character(f.into_active_model(name).insert(self.db).await?)
            }
            CatalogFields::Planet(f) => CatalogRecord::Planet(f.into_active_model(name).insert(self.db).await?),
            CatalogFields::Species(f) => {
                CatalogRecord::Species(f.into_active_model(name).insert(self.db).await?)
            }
            CatalogFields::Vehicle(f) => {
                CatalogRecord::Vehicle(f.into_active_model(name).insert(self.db).await?)
            }
        };
        info!("{} created id={}", record.kind(), record.id());
        Ok(record)
    }

    async fn replace(&self, id: i32, name: String, fields: CatalogFields) -> Result<CatalogRecord, AppError> {
        let record = match fields {
            CatalogFields::Character(f) => {
                let mut active = f.into_active_model(name);
                active.id = Set(id);
                CatalogRecord::Character(active.update(self.db).await?)
            }
            CatalogFields::Planet(f) => {
                let mut active = f.into_active_model(name);
                active.id = Set(id);
                CatalogRecord::Planet(active.update(self.db).await?)
            }
            CatalogFields::Species(f) => {
                let mut active = f.into_active_model(name);
                active.id = Set(id);
                CatalogRecord::Species(active.update(self.db).await?)
            }
            CatalogFields::Vehicle(f) => {
                let mut active = f.into_active_model(name);
                active.id = Set(id);
                CatalogRecord::Vehicle(active.update(self.db).await?)
            }
        };
        Ok(record)
    }
}

impl<'a, C: ConnectionTrait + TransactionTrait> CatalogRepository<'a, C> {
    pub async fn update(&self, id: i32, fields: CatalogFields) -> Result<CatalogRecord, AppError> {
        let kind = fields.kind();
        let name = fields.required_name()?;
        self.db
            .transaction::<_, CatalogRecord, AppError>(move |txn| {
                Box::pin(async move {
                    let repo = CatalogRepository::new(txn);
                    if !repo.exists(kind, id).await? {
                        return Err(target_not_found(kind, id));
                    }
                    let record = repo.replace(id, name, fields).await?;
                    debug!("{} updated id={}", kind, id);
                    Ok(record)
                })
            })
            .await
            .map_err(map_tx_error)
    }

    pub async fn delete(&self, kind: EntityKind, id: i32) -> Result<(), AppError> {
        self.db
            .transaction::<_, (), AppError>(move |txn| {
                Box::pin(async move {
                    // holds off concurrent add_favorite until the row is gone
                    if !CatalogRepository::new(txn).lock_row(kind, id, LockType::Update).await? {
                        return Err(target_not_found(kind, id));
                    }
                    let removed = FavoriteRepository::new(txn)
                        .remove_for_target(FavoriteTarget { kind, id })
                        .await?;
                    match kind {
                        EntityKind::Character => character::Entity::delete_by_id(id).exec(txn).await?,
                        EntityKind::Planet => planet::Entity::delete_by_id(id).exec(txn).await?,
                        EntityKind::Species => species::Entity::delete_by_id(id).exec(txn).await?,
                        EntityKind::Vehicle => vehicle::Entity::delete_by_id(id).exec(txn).await?,
                    };
                    info!("{} deleted id={} favorites_removed={}", kind, id, removed);
                    Ok(())
                })
            })
            .await
            .map_err(map_tx_error)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::test_db;
    use crate::store::fixtures::insert_character;

    fn with_id(mut input: serde_json::Value, id: i32) -> serde_json::Value {
        input["id"] = json!(id);
        input
    }

    #[actix_rt::test]
    async fn create_then_get_round_trips_every_kind() {
        let db = test_db().await;
        let repo = CatalogRepository::new(&db);
        let inputs = [
            (
                EntityKind::Character,
                json!({
                    "name": "Luke Skywalker", "birth_year": 19, "homeworld": "Tatooine",
                    "gender": "male", "eye_color": "blue", "hair_color": "blond",
                    "height": 172, "mass": 77, "skin_color": "fair"
                }),
            ),
            (
                EntityKind::Planet,
                json!({
                    "name": "Tatooine", "climate": "arid", "population": 200000,
                    "terrain": "desert", "diameter": 10465, "surface_water": 1,
                    "gravity": "1 standard", "rotation_period": 23, "orbital_period": 304
                }),
            ),
            (
                EntityKind::Species,
                json!({
                    "name": "Wookie", "classification": "mammal", "designation": "sentient",
                    "language": "Shyriiwook", "average_height": 210, "average_lifespan": 400,
                    "eye_colors": "blue, green", "hair_colors": "black, brown", "skin_colors": "gray"
                }),
            ),
            (
                EntityKind::Vehicle,
                json!({
                    "name": "Sand Crawler", "model": "Digger Crawler", "vehicle_class": "wheeled",
                    "consumables": "2 months", "length": 36, "max_atmosphering_speed": 30,
                    "cargo_capacity": 50000, "crew": 46, "passengers": 30,
                    "manufacturer": "Corellia Mining Corporation"
                }),
            ),
        ];

        for (kind, input) in inputs {
            let fields = CatalogFields::from_json(kind, input.clone()).unwrap();
            let created = repo.create(fields).await.unwrap();
            let fetched = repo.get(kind, created.id()).await.unwrap();

            assert_eq!(fetched.kind(), kind);
            assert_eq!(serde_json::to_value(&fetched).unwrap(), with_id(input, created.id()));
        }
    }

    #[actix_rt::test]
    async fn absent_optional_fields_are_stored_as_null() {
        let db = test_db().await;
        let repo = CatalogRepository::new(&db);
        let fields = CatalogFields::from_json(EntityKind::Planet, json!({"name": "Hoth"})).unwrap();

        let created = repo.create(fields).await.unwrap();
        let value = serde_json::to_value(&created).unwrap();
        assert_eq!(value["name"], "Hoth");
        assert!(value["climate"].is_null());
        assert!(value["population"].is_null());
    }

    #[actix_rt::test]
    async fn missing_name_is_validation_error() {
        let db = test_db().await;
        let fields = CatalogFields::from_json(EntityKind::Vehicle, json!({"model": "T-16"})).unwrap();
        let err = CatalogRepository::new(&db).create(fields).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let fields = CatalogFields::from_json(EntityKind::Vehicle, json!({"name": "  "})).unwrap();
        let err = CatalogRepository::new(&db).create(fields).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn wrong_field_type_is_validation_error() {
        let err = CatalogFields::from_json(EntityKind::Character, json!({"name": "R2", "height": "tall"}))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { details: Some(_), .. }));
    }

    #[actix_rt::test]
    async fn duplicate_name_is_conflict() {
        let db = test_db().await;
        insert_character(&db, "Han Solo").await;
        let fields = CatalogFields::from_json(EntityKind::Character, json!({"name": "Han Solo"})).unwrap();
        let err = CatalogRepository::new(&db).create(fields).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[actix_rt::test]
    async fn list_is_ordered_by_id() {
        let db = test_db().await;
        let first = insert_character(&db, "Leia Organa").await;
        let second = insert_character(&db, "C-3PO").await;

        let ids: Vec<i32> = CatalogRepository::new(&db)
            .list(EntityKind::Character)
            .await
            .unwrap()
            .iter()
            .map(CatalogRecord::id)
            .collect();
        assert_eq!(ids, vec![first, second]);
        assert!(CatalogRepository::new(&db).list(EntityKind::Vehicle).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn update_replaces_all_fields() {
        let db = test_db().await;
        let repo = CatalogRepository::new(&db);
        let fields = CatalogFields::from_json(
            EntityKind::Character,
            json!({"name": "Anakin", "gender": "male", "height": 188}),
        )
        .unwrap();
        let created = repo.create(fields).await.unwrap();

        let replacement =
            CatalogFields::from_json(EntityKind::Character, json!({"name": "Darth Vader", "height": 202})).unwrap();
        let updated = repo.update(created.id(), replacement).await.unwrap();

        let value = serde_json::to_value(&updated).unwrap();
        assert_eq!(value["id"], created.id());
        assert_eq!(value["name"], "Darth Vader");
        assert_eq!(value["height"], 202);
        assert!(value["gender"].is_null());
        assert_eq!(repo.get(EntityKind::Character, created.id()).await.unwrap(), updated);
    }

    #[actix_rt::test]
    async fn update_and_delete_missing_record_are_not_found() {
        let db = test_db().await;
        let repo = CatalogRepository::new(&db);

        let fields = CatalogFields::from_json(EntityKind::Species, json!({"name": "Ewok"})).unwrap();
        let err = repo.update(99, fields).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { resource: "species", .. }));

        let err = repo.delete(EntityKind::Planet, 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { resource: "planet", .. }));
        assert_eq!(err.to_string(), "Planet with ID 99 not found");
    }

    #[actix_rt::test]
    async fn delete_removes_record() {
        let db = test_db().await;
        let id = insert_character(&db, "Greedo").await;
        let repo = CatalogRepository::new(&db);

        repo.delete(EntityKind::Character, id).await.unwrap();
        assert!(!repo.exists(EntityKind::Character, id).await.unwrap());
        assert!(matches!(
            repo.get(EntityKind::Character, id).await,
            Err(AppError::NotFound { resource: "character", .. })
        ));
    }

    #[test]
    fn row_locks_render_for_postgres_only() {
        let update = locking_select(EntityKind::Vehicle, 3, LockType::Update, DbBackend::Postgres);
        assert!(update.sql.contains("FOR UPDATE"), "{}", update.sql);
        let share = locking_select(EntityKind::Planet, 3, LockType::Share, DbBackend::Postgres);
        assert!(share.sql.contains("FOR SHARE"), "{}", share.sql);

        let sqlite = locking_select(EntityKind::Planet, 3, LockType::Update, DbBackend::Sqlite);
        assert!(!sqlite.sql.contains("FOR "), "{}", sqlite.sql);
    }

    #[actix_rt::test]
    async fn lock_row_reports_presence() {
        let db = test_db().await;
        let id = insert_character(&db, "Wedge Antilles").await;
        let repo = CatalogRepository::new(&db);

        assert!(repo.lock_row(EntityKind::Character, id, LockType::Share).await.unwrap());
        assert!(!repo.lock_row(EntityKind::Species, id, LockType::Share).await.unwrap());
    }
}
