use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "t_species")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub classification: Option<String>,
    pub designation: Option<String>,
    pub language: Option<String>,
    pub average_height: Option<i32>,
    pub average_lifespan: Option<i32>,
    pub eye_colors: Option<String>,
    pub hair_colors: Option<String>,
    pub skin_colors: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
