//! Artist operations on top of the typed collection.
//!
//! Every operation takes the caller's [`RequestContext`] so log lines share
//! its id and store calls honour its deadline.

use gostream_store::{
    Collection, Connection, Mutation, Predicate, Query, RequestContext, StoreError, Update,
};
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ArtistError;
use crate::model::{ArtistInfo, CreateArtistRequest, UpdateArtistRequest};
use crate::validation;

/// Create, read, update and delete artists.
#[derive(Debug, Clone)]
pub struct ArtistService {
    artists: Collection<ArtistInfo>,
}

impl ArtistService {
    /// Bind the service to `database.collection` on `connection`.
    pub fn new(connection: &Connection, database: &str, collection: &str) -> Self {
        Self {
            artists: Collection::new(connection, database, collection),
        }
    }

    /// Parse and validate a JSON create body, assign a fresh id and store
    /// the artist.
    pub async fn create(&self, ctx: &RequestContext, body: &[u8]) -> Result<ArtistInfo, ArtistError> {
        let request: CreateArtistRequest = parse_body(ctx, body)?;
        if let Err(field) = validation::validate_create(&request) {
            warn!(request_id = %ctx.id(), field = field.field_ref, "failed request body validation");
            return Err(field.into());
        }

        let artist = request.into_artist(Uuid::new_v4().to_string());

        let existing = self
            .artists
            .find_one(ctx, &Query::by_id(artist.id.as_str()))
            .await
            .map_err(|e| store_failure(ctx, "look up artist", e))?;
        if existing.is_some() {
            warn!(request_id = %ctx.id(), id = %artist.id, "artist already exists");
            return Err(ArtistError::Conflict);
        }

        match self.artists.create(ctx, &artist).await {
            Ok(()) => {
                info!(request_id = %ctx.id(), id = %artist.id, "artist created");
                Ok(artist)
            }
            Err(e) if e.is_duplicate_key() => {
                warn!(request_id = %ctx.id(), id = %artist.id, "artist already exists");
                Err(ArtistError::Conflict)
            }
            Err(e) => Err(store_failure(ctx, "create artist", e)),
        }
    }

    /// Fetch one artist by id.
    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<ArtistInfo, ArtistError> {
        self.artists
            .find_one(ctx, &Query::by_id(id))
            .await
            .map_err(|e| store_failure(ctx, "retrieve artist", e))?
            .ok_or(ArtistError::NotFound)
    }

    /// List artists, optionally only those named `name`, at most `limit`
    /// of them (`0` is unlimited).
    pub async fn list(
        &self,
        ctx: &RequestContext,
        name: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ArtistInfo>, ArtistError> {
        let conditions: Vec<Predicate> = name
            .map(|name| Predicate::eq("name", name))
            .into_iter()
            .collect();
        let query = Query {
            root: (!conditions.is_empty()).then(|| Predicate::and(conditions)),
            limit,
        };

        self.artists
            .find(ctx, &query)
            .await
            .map_err(|e| store_failure(ctx, "retrieve artists", e))
    }

    /// Apply the fields present in a JSON update body to the artist `id`.
    ///
    /// Checks run in order: id format, existence, body syntax, body fields.
    /// Returns how many documents changed; `0` when every provided value
    /// was already current.
    pub async fn update(&self, ctx: &RequestContext, id: &str, body: &[u8]) -> Result<u64, ArtistError> {
        if let Err(path) = validation::validate_id(id) {
            warn!(request_id = %ctx.id(), "failed path parameter validation");
            return Err(path.into());
        }

        if let Err(e) = self.get(ctx, id).await {
            if matches!(e, ArtistError::NotFound) {
                warn!(request_id = %ctx.id(), id, "could not find artist");
            }
            return Err(e);
        }

        let request: UpdateArtistRequest = parse_body(ctx, body)?;
        if let Err(field) = validation::validate_update(&request) {
            warn!(request_id = %ctx.id(), field = field.field_ref, "failed request body validation");
            return Err(field.into());
        }

        let update = Update::new(changes(&request));
        let modified = self
            .artists
            .update(ctx, &Query::matching(Predicate::eq("_id", id)), &update)
            .await
            .map_err(|e| store_failure(ctx, "update artist", e))?;

        if modified == 0 {
            warn!(request_id = %ctx.id(), id, "zero modified items");
        }
        Ok(modified)
    }

    /// Delete the artist `id`. Returns how many were removed.
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<u64, ArtistError> {
        self.artists
            .delete(ctx, id)
            .await
            .map_err(|e| store_failure(ctx, "delete artist", e))
    }
}

/// One `$set` of just the fields the request carries.
fn changes(request: &UpdateArtistRequest) -> Mutation {
    let mut set = Mutation::set();
    if let Some(name) = &request.name {
        set = set.with("name", name.as_str());
    }
    if let Some(genres) = &request.genres {
        set = set.with("genres", genres.clone());
    }
    if let Some(followers) = request.followers {
        set = set.with("followers", i64::from(followers));
    }
    if let Some(popularity) = request.stats.and_then(|stats| stats.popularity) {
        set = set.with("stats.popularity", f64::from(popularity));
    }
    set
}

fn parse_body<T: DeserializeOwned>(ctx: &RequestContext, body: &[u8]) -> Result<T, ArtistError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(request_id = %ctx.id(), error = %e, "failed to extract request body");
        ArtistError::InvalidBody(e)
    })
}

fn store_failure(ctx: &RequestContext, action: &str, err: StoreError) -> ArtistError {
    if err.is_cancelled() {
        warn!(request_id = %ctx.id(), error = %err, "failed to {action}");
    } else {
        error!(request_id = %ctx.id(), error = %err, "failed to {action}");
    }
    ArtistError::Store(err)
}
