use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "t_planet")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub climate: Option<String>,
    pub population: Option<i64>,
    pub terrain: Option<String>,
    pub diameter: Option<i32>,
    pub surface_water: Option<i32>,
    pub gravity: Option<String>,
    pub rotation_period: Option<i32>,
    pub orbital_period: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
