//! Collection behaviour over the in-memory backend.
//!
//! Exercises the typed accessor end to end: predicate and mutation trees
//! are lowered to native documents and evaluated in process, so these run
//! under plain `cargo test` with no services.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;
use std::time::Duration;

use gostream_store::bson::doc;
use gostream_store::{
    CancelCause, CancelSignal, Collection, Connection, Entity, InMemoryBackend, Mutation, Predicate,
    Query, RequestContext, StoreError, Update,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Stats {
    popularity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Artist {
    id: String,
    name: String,
    genres: Vec<String>,
    followers: u32,
    stats: Stats,
}

impl Entity for Artist {}

fn artist(id: &str, name: &str, followers: u32) -> Artist {
    Artist {
        id: id.to_owned(),
        name: name.to_owned(),
        genres: vec![String::from("rock")],
        followers,
        stats: Stats { popularity: 0.5 },
    }
}

fn artists(connection: &Connection) -> Collection<Artist> {
    Collection::new(connection, "gostream", "artists")
}

async fn seeded() -> (Collection<Artist>, RequestContext) {
    let artists = artists(&Connection::in_memory());
    let ctx = RequestContext::new();
    for (id, name, followers) in [
        ("a1", "Artist A", 10),
        ("a2", "Artist B", 20),
        ("a3", "Artist C", 30),
        ("a4", "Artist D", 20),
    ] {
        artists
            .create(&ctx, &artist(id, name, followers))
            .await
            .unwrap();
    }
    (artists, ctx)
}

// =============================================================================
// create / find
// =============================================================================

#[tokio::test]
async fn create_then_find_by_id_returns_entity() {
    let artists = artists(&Connection::in_memory());
    let ctx = RequestContext::new();
    let a1 = artist("a1", "Artist A", 10);

    artists.create(&ctx, &a1).await.unwrap();

    let found = artists
        .find(&ctx, &Query::matching(Predicate::eq("_id", "a1")).with_limit(1))
        .await
        .unwrap();
    assert_eq!(found, vec![a1]);
}

#[tokio::test]
async fn duplicate_create_fails_and_keeps_one_document() {
    let backend = InMemoryBackend::new();
    let connection = Connection::from_backend(Arc::new(backend.clone()));
    let artists = artists(&connection);
    let ctx = RequestContext::new();

    artists
        .create(&ctx, &artist("a1", "Artist A", 10))
        .await
        .unwrap();
    let err = artists
        .create(&ctx, &artist("a1", "Someone Else", 99))
        .await
        .unwrap_err();

    assert!(err.is_duplicate_key());
    assert_eq!(backend.document_count(artists.namespace()).await, 1);
    let kept = artists.find_one(&ctx, &Query::by_id("a1")).await.unwrap();
    assert_eq!(kept.map(|a| a.name), Some(String::from("Artist A")));
}

#[tokio::test]
async fn concurrent_creates_on_one_key_have_one_winner() {
    let artists = artists(&Connection::in_memory());

    let mut handles = Vec::new();
    for n in 0..8_u32 {
        let artists = artists.clone();
        handles.push(tokio::spawn(async move {
            artists
                .create(&RequestContext::new(), &artist("a1", "Artist A", n))
                .await
        }));
    }

    let mut wins = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => wins += 1,
            Err(e) if e.is_duplicate_key() => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(duplicates, 7);
}

#[tokio::test]
async fn find_without_match_is_empty() {
    let (artists, ctx) = seeded().await;
    let found = artists
        .find(&ctx, &Query::matching(Predicate::eq("name", "Nobody")))
        .await
        .unwrap();
    assert!(found.is_empty());
    assert!(
        artists
            .find_one(&ctx, &Query::by_id("missing"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn limit_zero_returns_all_and_n_caps() {
    let (artists, ctx) = seeded().await;

    assert_eq!(artists.find(&ctx, &Query::all()).await.unwrap().len(), 4);
    assert_eq!(
        artists
            .find(&ctx, &Query::all().with_limit(2))
            .await
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        artists
            .find(&ctx, &Query::all().with_limit(10))
            .await
            .unwrap()
            .len(),
        4
    );
}

#[tokio::test]
async fn empty_and_matches_everything_at_any_depth() {
    let (artists, ctx) = seeded().await;
    let nested = Predicate::and(vec![Predicate::and(vec![Predicate::all()])]);
    let found = artists.find(&ctx, &Query::matching(nested)).await.unwrap();
    assert_eq!(found.len(), 4);
}

#[tokio::test]
async fn empty_or_matches_nothing() {
    let (artists, ctx) = seeded().await;
    let found = artists
        .find(&ctx, &Query::matching(Predicate::or(Vec::new())))
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn and_child_order_does_not_change_matches() {
    let (artists, ctx) = seeded().await;
    let a = Predicate::eq("followers", 20_i64);
    let b = Predicate::eq("genres", "rock");

    let forward = artists
        .find(&ctx, &Query::matching(Predicate::and(vec![a.clone(), b.clone()])))
        .await
        .unwrap();
    let reversed = artists
        .find(&ctx, &Query::matching(Predicate::and(vec![b, a])))
        .await
        .unwrap();

    let ids = |found: &[Artist]| found.iter().map(|a| a.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&forward), vec!["a2", "a4"]);
    assert_eq!(ids(&forward), ids(&reversed));
}

#[tokio::test]
async fn or_and_in_select_expected_ids() {
    let (artists, ctx) = seeded().await;

    let either = Predicate::or(vec![
        Predicate::eq("name", "Artist A"),
        Predicate::eq("followers", 30_i32),
    ]);
    let found = artists.find(&ctx, &Query::matching(either)).await.unwrap();
    let ids: Vec<_> = found.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a3"]);

    let listed = artists
        .find(&ctx, &Query::matching(Predicate::is_in("_id", ["a4", "a2", "zz"])))
        .await
        .unwrap();
    let ids: Vec<_> = listed.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a2", "a4"]);
}

#[tokio::test]
async fn dotted_keys_reach_nested_fields() {
    let (artists, ctx) = seeded().await;
    let found = artists
        .find(&ctx, &Query::matching(Predicate::eq("stats.popularity", 0.5_f64)))
        .await
        .unwrap();
    assert_eq!(found.len(), 4);
}

#[tokio::test]
async fn malformed_key_fails_fast() {
    let (artists, ctx) = seeded().await;
    let err = artists
        .find(&ctx, &Query::matching(Predicate::eq("stats..popularity", 1_i32)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey(ref key) if key == "stats..popularity"));

    let err = artists
        .update(&ctx, &Query::by_id("a1"), &Mutation::set_field("", 1_i32).into())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey(_)));
}

#[tokio::test]
async fn operator_key_is_not_a_field() {
    let (artists, ctx) = seeded().await;
    let disguised = Predicate::eq(
        "$or",
        vec![doc! { "name": "nobody" }, doc! { "name": "Artist A" }],
    );
    let err = artists
        .find(&ctx, &Query::matching(disguised))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey(ref key) if key == "$or"));

    let err = artists
        .find(&ctx, &Query::matching(Predicate::eq("$where", "true")))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey(_)));

    let err = artists
        .update(&ctx, &Query::by_id("a1"), &Mutation::set_field("$x", 1_i32).into())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey(_)));
}

// =============================================================================
// update
// =============================================================================

#[tokio::test]
async fn update_sets_field_and_leaves_others() {
    let (artists, ctx) = seeded().await;

    let modified = artists
        .update(
            &ctx,
            &Query::matching(Predicate::eq("_id", "a1")),
            &Mutation::set_field("followers", 20_i64).into(),
        )
        .await
        .unwrap();
    assert_eq!(modified, 1);

    let a1 = artists
        .find_one(&ctx, &Query::by_id("a1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a1.followers, 20);
    assert_eq!(a1.name, "Artist A");
    assert_eq!(a1.genres, vec![String::from("rock")]);
}

#[tokio::test]
async fn update_with_current_values_is_idempotent() {
    let (artists, ctx) = seeded().await;
    let query = Query::by_id("a2");
    let update = Update::new(Mutation::set().with("name", "Artist B").with("genres", vec!["rock"]));

    let first = artists.update(&ctx, &query, &update).await.unwrap();
    let second = artists.update(&ctx, &query, &update).await.unwrap();
    assert_eq!(first, 0);
    assert_eq!(second, 0);
    let a2 = artists.find_one(&ctx, &query).await.unwrap().unwrap();
    assert_eq!(a2, artist("a2", "Artist B", 20));
}

#[tokio::test]
async fn update_ignores_query_limit() {
    let (artists, ctx) = seeded().await;
    let query = Query::matching(Predicate::eq("followers", 20_i64)).with_limit(1);
    let modified = artists
        .update(&ctx, &query, &Mutation::set_field("name", "Twenty").into())
        .await
        .unwrap();
    assert_eq!(modified, 2);
}

#[tokio::test]
async fn inert_update_returns_zero() {
    let (artists, ctx) = seeded().await;
    let update = Update::new(Mutation::Batch(vec![Mutation::set(), Mutation::Batch(Vec::new())]));
    let modified = artists.update(&ctx, &Query::all(), &update).await.unwrap();
    assert_eq!(modified, 0);
}

#[tokio::test]
async fn batch_update_applies_set_and_increment() {
    let (artists, ctx) = seeded().await;
    let update = Update::new(Mutation::Batch(vec![
        Mutation::set_field("stats.popularity", 0.75_f64),
        Mutation::increment("followers", 5_i32),
    ]));

    let modified = artists.update(&ctx, &Query::by_id("a3"), &update).await.unwrap();
    assert_eq!(modified, 1);

    let a3 = artists
        .find_one(&ctx, &Query::by_id("a3"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a3.followers, 35);
    assert_eq!(a3.stats.popularity, 0.75);
}

#[tokio::test]
async fn update_without_match_is_zero() {
    let (artists, ctx) = seeded().await;
    let modified = artists
        .update(&ctx, &Query::by_id("missing"), &Mutation::set_field("name", "x").into())
        .await
        .unwrap();
    assert_eq!(modified, 0);
}

#[tokio::test]
async fn update_changing_id_is_rejected() {
    let (artists, ctx) = seeded().await;
    let err = artists
        .update(&ctx, &Query::by_id("a1"), &Mutation::set_field("_id", "b1").into())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Rejected(_)));
}

// =============================================================================
// delete
// =============================================================================

#[tokio::test]
async fn delete_removes_one_document() {
    let (artists, ctx) = seeded().await;
    assert_eq!(artists.delete(&ctx, "a1").await.unwrap(), 1);
    assert!(
        artists
            .find_one(&ctx, &Query::by_id("a1"))
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(artists.find(&ctx, &Query::all()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn delete_absent_key_is_zero() {
    let (artists, ctx) = seeded().await;
    assert_eq!(artists.delete(&ctx, "missing").await.unwrap(), 0);
    assert_eq!(artists.delete(&ctx, "a1").await.unwrap(), 1);
    assert_eq!(artists.delete(&ctx, "a1").await.unwrap(), 0);
}

// =============================================================================
// decoding and cancellation
// =============================================================================

#[tokio::test]
async fn foreign_document_shape_is_decode_error() {
    let backend = InMemoryBackend::new();
    let connection = Connection::from_backend(Arc::new(backend.clone()));
    let artists = artists(&connection);
    backend_insert(&backend, &artists, doc! { "_id": "x1", "name": 42 }).await;

    let err = artists
        .find(&RequestContext::new(), &Query::all())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Decode(_)));
}

async fn backend_insert(
    backend: &InMemoryBackend,
    collection: &Collection<Artist>,
    document: gostream_store::bson::Document,
) {
    use gostream_store::DocumentBackend;
    backend
        .insert_one(collection.namespace(), document)
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_context_stops_operations() {
    let (artists, _) = seeded().await;
    let signal = CancelSignal::new();
    signal.cancel();
    let ctx = RequestContext::new().with_cancel(signal);

    let err = artists.find(&ctx, &Query::all()).await.unwrap_err();
    assert!(matches!(err, StoreError::Cancelled(CancelCause::Signal)));

    let err = artists
        .create(&ctx, &artist("a9", "Late", 1))
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn generous_deadline_does_not_interfere() {
    let (artists, _) = seeded().await;
    let ctx = RequestContext::new().with_timeout(Duration::from_secs(30));
    assert_eq!(artists.find(&ctx, &Query::all()).await.unwrap().len(), 4);
}
