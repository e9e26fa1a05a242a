//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{attempts, challenges, images};

/// Database row for an image.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = images)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ImageRow {
    pub creator_name: String,
    pub image_name: String,
    pub image_tag: String,
    pub cor_id: String,
    pub image_registry_link: String,
    pub created_at: String,
}

/// Database row for a challenge. `participants` is a JSON array.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = challenges)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChallengeRow {
    pub cor_id: String,
    pub creator_name: String,
    pub challenge_name: String,
    pub image_name: String,
    pub image_tag: String,
    pub participants: String,
    pub image_registry_link: String,
    pub created_at: String,
}

/// Database row for an attempt.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = attempts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AttemptRow {
    pub token: String,
    pub participant: String,
    pub ssh_key: String,
    pub result: f64,
    pub ip_address: String,
    pub port: String,
    pub challenge_name: String,
    pub creator_name: String,
    pub image_registry_link: String,
    pub created_at: String,
}
