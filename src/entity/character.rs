use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "t_character")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub birth_year: Option<i32>,
    pub homeworld: Option<String>,
    pub gender: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub height: Option<i32>,
    pub mass: Option<i32>,
    pub skin_color: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
