use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "t_vehicle")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_name = "model")]
    #[serde(rename = "model")]
    pub model_name: Option<String>,
    pub vehicle_class: Option<String>,
    pub consumables: Option<String>,
    pub length: Option<i32>,
    pub max_atmosphering_speed: Option<i32>,
    pub cargo_capacity: Option<i32>,
    pub crew: Option<i32>,
    pub passengers: Option<i32>,
    pub manufacturer: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
