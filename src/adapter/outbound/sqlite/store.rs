//! SQLite record store implementation.
//!
//! Provides persistent storage for challenges, attempts, and images using
//! SQLite and Diesel ORM. Unique-index violations surface as
//! [`StoreError::Duplicate`].

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use super::database::connection::DbPool;
use super::database::model::{AttemptRow, ChallengeRow, ImageRow};
use super::database::schema::{attempts, challenges, images};
use crate::domain::{
    Attempt, AttemptBinding, AttemptToken, Challenge, CorrelationId, Image, ImageKey,
};
use crate::error::{Error, Result, StoreError};
use crate::port::RecordStore;

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed record store.
pub struct SqliteRecordStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteRecordStore {
    /// Create a new SQLite record store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<Conn> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    fn image_to_row(image: &Image) -> ImageRow {
        ImageRow {
            creator_name: image.creator_name.clone(),
            image_name: image.image_name.clone(),
            image_tag: image.image_tag.clone(),
            cor_id: image.cor_id.to_string(),
            image_registry_link: image.image_registry_link.clone(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    fn image_from_row(row: ImageRow) -> Image {
        Image {
            cor_id: CorrelationId::new(row.cor_id),
            creator_name: row.creator_name,
            image_name: row.image_name,
            image_tag: row.image_tag,
            image_registry_link: row.image_registry_link,
        }
    }

    fn challenge_to_row(challenge: &Challenge) -> Result<ChallengeRow> {
        Ok(ChallengeRow {
            cor_id: challenge.cor_id.to_string(),
            creator_name: challenge.creator_name.clone(),
            challenge_name: challenge.challenge_name.clone(),
            image_name: challenge.image_name.clone(),
            image_tag: challenge.image_tag.clone(),
            participants: serde_json::to_string(&challenge.participants)?,
            image_registry_link: challenge.image_registry_link.clone(),
            created_at: Utc::now().to_rfc3339(),
        })
    }

    fn challenge_from_row(row: ChallengeRow) -> Result<Challenge> {
        Ok(Challenge {
            cor_id: CorrelationId::new(row.cor_id),
            creator_name: row.creator_name,
            challenge_name: row.challenge_name,
            image_name: row.image_name,
            image_tag: row.image_tag,
            participants: serde_json::from_str(&row.participants)?,
            image_registry_link: row.image_registry_link,
        })
    }

    fn attempt_to_row(attempt: &Attempt) -> AttemptRow {
        AttemptRow {
            token: attempt.token.to_string(),
            participant: attempt.participant.clone(),
            ssh_key: attempt.ssh_key.clone(),
            result: attempt.result,
            ip_address: attempt.ip_address.clone(),
            port: attempt.port.clone(),
            challenge_name: attempt.challenge_name.clone(),
            creator_name: attempt.creator_name.clone(),
            image_registry_link: attempt.image_registry_link.clone(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    fn attempt_from_row(row: AttemptRow) -> Attempt {
        Attempt {
            participant: row.participant,
            token: AttemptToken::new(row.token),
            ssh_key: row.ssh_key,
            result: row.result,
            ip_address: row.ip_address,
            port: row.port,
            challenge_name: row.challenge_name,
            creator_name: row.creator_name,
            image_registry_link: row.image_registry_link,
        }
    }
}

/// Map an insert failure, turning unique violations into `Duplicate`.
fn insert_error(collection: &'static str, key: String, err: DieselError) -> Error {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::Duplicate { collection, key }.into()
        }
        other => Error::Database(other.to_string()),
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find_image(&self, key: &ImageKey) -> Result<Option<Image>> {
        let mut conn = self.conn()?;
        let row: Option<ImageRow> = images::table
            .find((&key.creator_name, &key.image_name, &key.image_tag))
            .select(ImageRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row.map(Self::image_from_row))
    }

    async fn insert_image(&self, image: &Image) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(images::table)
            .values(&Self::image_to_row(image))
            .execute(&mut conn)
            .map_err(|e| insert_error("image", image.key().to_string(), e))?;
        Ok(())
    }

    async fn insert_challenge(&self, challenge: &Challenge) -> Result<()> {
        let row = Self::challenge_to_row(challenge)?;
        let mut conn = self.conn()?;
        diesel::insert_into(challenges::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| {
                insert_error(
                    "challenge",
                    format!("{}/{}", challenge.creator_name, challenge.challenge_name),
                    e,
                )
            })?;
        Ok(())
    }

    async fn find_challenge(
        &self,
        creator_name: &str,
        challenge_name: &str,
    ) -> Result<Option<Challenge>> {
        let mut conn = self.conn()?;
        let row: Option<ChallengeRow> = challenges::table
            .filter(challenges::creator_name.eq(creator_name))
            .filter(challenges::challenge_name.eq(challenge_name))
            .select(ChallengeRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(Self::challenge_from_row).transpose()
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(attempts::table)
            .values(&Self::attempt_to_row(attempt))
            .execute(&mut conn)
            .map_err(|e| insert_error("attempt", attempt.token.to_string(), e))?;
        Ok(())
    }

    async fn find_attempt(&self, token: &AttemptToken) -> Result<Option<Attempt>> {
        let mut conn = self.conn()?;
        let row: Option<AttemptRow> = attempts::table
            .find(token.as_str())
            .select(AttemptRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row.map(Self::attempt_from_row))
    }

    async fn bind_attempt(
        &self,
        token: &AttemptToken,
        binding: &AttemptBinding,
    ) -> Result<Attempt> {
        let mut conn = self.conn()?;
        let updated = diesel::update(attempts::table.find(token.as_str()))
            .set((
                attempts::ip_address.eq(&binding.ip_address),
                attempts::port.eq(binding.port.to_string()),
                attempts::ssh_key.eq(&binding.private_key),
            ))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        if updated == 0 {
            return Err(StoreError::NotFound {
                collection: "attempt",
                key: token.to_string(),
            }
            .into());
        }

        let row: AttemptRow = attempts::table
            .find(token.as_str())
            .select(AttemptRow::as_select())
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self::attempt_from_row(row))
    }

    async fn list_attempts(
        &self,
        creator_name: &str,
        challenge_name: &str,
    ) -> Result<Vec<Attempt>> {
        let mut conn = self.conn()?;
        let rows: Vec<AttemptRow> = attempts::table
            .filter(attempts::creator_name.eq(creator_name))
            .filter(attempts::challenge_name.eq(challenge_name))
            .order(attempts::participant.asc())
            .select(AttemptRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.into_iter().map(Self::attempt_from_row).collect())
    }
}
