pub mod catalog;
pub mod favorite;
pub mod user;

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Character,
    Planet,
    Species,
    Vehicle,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Character,
        EntityKind::Planet,
        EntityKind::Species,
        EntityKind::Vehicle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Planet => "planet",
            Self::Species => "species",
            Self::Vehicle => "vehicle",
        }
    }

    pub fn collection(self) -> &'static str {
        match self {
            Self::Character => "characters",
            Self::Planet => "planets",
            Self::Species => "species",
            Self::Vehicle => "vehicles",
        }
    }

    pub fn singular_key(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Planet => "planet",
            Self::Species => "specie",
            Self::Vehicle => "vehicle",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Character => "Character",
            Self::Planet => "Planet",
            Self::Species => "Species",
            Self::Vehicle => "Vehicle",
        }
    }

    pub fn from_collection(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.collection() == segment)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}


#[cfg(test)]
pub mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};
    use sea_orm::DatabaseConnection;

    use super::catalog::{CatalogFields, CatalogRepository, CharacterFields, PlanetFields};
    use super::user::{NewUser, UserRepository};
    use crate::entity::user;

    pub fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@x.com", username),
            password_hash: "$2b$04$not-a-real-hash".to_string(),
            is_active: true,
            subscription_date: NaiveDateTime::parse_from_str("2024-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            birthdate: NaiveDate::from_ymd_opt(1990, 5, 4),
        }
    }

    pub fn luke() -> NewUser {
        NewUser {
            email: "luke@x.com".to_string(),
            first_name: "Luke".to_string(),
            last_name: "Sky".to_string(),
            ..new_user("luke99")
        }
    }

    pub async fn insert_user(db: &DatabaseConnection, username: &str) -> user::Model {
        UserRepository::new(db).create(new_user(username)).await.unwrap()
    }

    pub async fn insert_character(db: &DatabaseConnection, name: &str) -> i32 {
        let fields = CatalogFields::Character(CharacterFields {
            name: Some(name.to_string()),
            ..Default::default()
        });
        CatalogRepository::new(db).create(fields).await.unwrap().id()
    }

    pub async fn insert_planet(db: &DatabaseConnection, name: &str) -> i32 {
        let fields = CatalogFields::Planet(PlanetFields {
            name: Some(name.to_string()),
            ..Default::default()
        });
        CatalogRepository::new(db).create(fields).await.unwrap().id()
    }
}
