#![cfg(test)]

use std::collections::VecDeque;
use std::result::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use googletest::prelude::*;
use rstest::{fixture, rstest};
use time::macros::datetime;
use tokio::sync::Notify;

use canvass_types::nominee::{Nominee, NomineeId, NomineeStatus};

use crate::snapshot::{CacheKey, SnapshotCache};

use super::*;

fn nominee(id: i64, name: &str) -> Nominee {
    Nominee {
        id: NomineeId(id),
        name: String::from(name),
        constituency: String::from("Riverside East"),
        category: String::from("council"),
        status: NomineeStatus::Pending,
        submitted_at: datetime!(2024-05-01 10:00 UTC),
    }
}

fn backend_error(message: &str) -> LoadError {
    LoadError::Backend { message: String::from(message) }
}

/// Returns scripted results in order and counts how often it was called.
struct ScriptedLoader {
    script: Mutex<VecDeque<Result<Vec<Nominee>, LoadError>>>,
    calls: AtomicUsize,
}

impl ScriptedLoader {
    fn new(script: Vec<Result<Vec<Nominee>, LoadError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::from(script)),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceLoader<Nominee> for Arc<ScriptedLoader> {
    async fn load(&self) -> Result<Vec<Nominee>, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front()
            .expect("ScriptedLoader ran out of scripted results")
    }
}

/// First call blocks until `gate` is notified, later calls answer directly.
struct GatedLoader {
    gate: Arc<Notify>,
    first: Vec<Nominee>,
    later: Vec<Nominee>,
    calls: AtomicUsize,
}

#[async_trait]
impl ResourceLoader<Nominee> for Arc<GatedLoader> {
    async fn load(&self) -> Result<Vec<Nominee>, LoadError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            self.gate.notified().await;
            Ok(self.first.clone())
        } else {
            Ok(self.later.clone())
        }
    }
}

struct Fixture {
    cache: SnapshotCache,
    cache_key: CacheKey,
    policy: RetryPolicy,
}

#[fixture]
fn fixture() -> Fixture {
    Fixture {
        cache: SnapshotCache::in_memory(Duration::from_secs(120)),
        cache_key: CacheKey::for_resource("nominees"),
        policy: RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(1),
        },
    }
}

impl Fixture {
    fn controller(&self, loader: impl ResourceLoader<Nominee> + 'static) -> ListController<Nominee> {
        ListController::with_policy(
            loader,
            self.cache.clone(),
            self.cache_key.clone(),
            self.policy,
        )
    }
}

async fn wait_until(condition: impl Fn() -> bool) {
    while !condition() {
        tokio::task::yield_now().await;
    }
}

#[rstest]
#[tokio::test]
async fn should_load_into_success_and_populate_the_cache(fixture: Fixture) {

    let rows = vec![nominee(1, "Ada Okafor")];
    let loader = ScriptedLoader::new(vec![Ok(rows.clone())]);
    let controller = fixture.controller(Arc::clone(&loader));

    assert_that!(controller.state(), eq(FetchState::Idle));

    controller.load().await;

    assert_that!(controller.state(), eq(FetchState::Success(rows.clone())));
    assert_that!(fixture.cache.read::<Nominee>(&fixture.cache_key), some(eq(rows)));
    assert_that!(loader.calls(), eq(1));
}

#[rstest]
#[tokio::test]
async fn should_accept_a_plain_async_closure_as_loader(fixture: Fixture) {

    let rows = vec![nominee(1, "Ada Okafor")];
    let loaded = rows.clone();
    let controller = fixture.controller(FnLoader(move || {
        let rows = loaded.clone();
        async move { Ok::<_, LoadError>(rows) }
    }));

    controller.load().await;

    assert_that!(controller.state(), eq(FetchState::Success(rows)));
}

#[rstest]
#[tokio::test]
async fn should_paint_the_cached_snapshot_before_the_fetch_settles(fixture: Fixture) {

    let cached = vec![nominee(1, "Ada Okafor")];
    let fresh = vec![nominee(1, "Ada Okafor"), nominee(2, "Ben Mensah")];
    fixture.cache.write(&fixture.cache_key, &cached);

    let gate = Arc::new(Notify::new());
    let loader = Arc::new(GatedLoader {
        gate: Arc::clone(&gate),
        first: fresh.clone(),
        later: Vec::new(),
        calls: AtomicUsize::new(0),
    });
    let controller = fixture.controller(Arc::clone(&loader));

    let load = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load().await }
    });

    wait_until(|| loader.calls.load(Ordering::SeqCst) == 1).await;

    // No spinner: the stale snapshot is already on screen.
    assert_that!(controller.state(), eq(FetchState::Success(cached)));
    assert_that!(controller.is_refreshing(), eq(true));

    gate.notify_one();
    load.await.unwrap();

    assert_that!(controller.state(), eq(FetchState::Success(fresh)));
    assert_that!(controller.is_refreshing(), eq(false));
}

#[rstest]
#[tokio::test]
async fn should_retry_once_and_then_succeed(fixture: Fixture) {

    let rows = vec![nominee(1, "Ada Okafor")];
    let loader = ScriptedLoader::new(vec![
        Err(backend_error("glitch")),
        Ok(rows.clone()),
    ]);
    let controller = fixture.controller(Arc::clone(&loader));

    controller.load().await;

    assert_that!(controller.state(), eq(FetchState::Success(rows)));
    assert_that!(loader.calls(), eq(2));
}

#[rstest]
#[tokio::test]
async fn should_fail_after_exhausting_the_retry_policy(fixture: Fixture) {

    let loader = ScriptedLoader::new(vec![
        Err(backend_error("down")),
        Err(backend_error("still down")),
    ]);
    let controller = fixture.controller(Arc::clone(&loader));

    controller.load().await;

    assert_that!(controller.state(), eq(FetchState::Failure(FailureInfo {
        kind: FailureKind::Backend,
        message: String::from("still down"),
    })));
    assert_that!(loader.calls(), eq(2));
}

#[rstest]
#[tokio::test]
async fn should_keep_the_stale_snapshot_when_the_refresh_fails(fixture: Fixture) {

    let cached = vec![nominee(1, "Ada Okafor")];
    fixture.cache.write(&fixture.cache_key, &cached);

    let loader = ScriptedLoader::new(vec![
        Err(backend_error("down")),
        Err(backend_error("still down")),
    ]);
    let controller = fixture.controller(Arc::clone(&loader));

    controller.load().await;

    assert_that!(controller.state(), eq(FetchState::Success(cached)));
    assert_that!(controller.last_warning(), some(eq(FailureInfo {
        kind: FailureKind::Backend,
        message: String::from("still down"),
    })));
}

#[rstest]
#[tokio::test]
async fn should_discard_the_superseded_response_when_a_newer_load_starts(fixture: Fixture) {

    let stale = vec![nominee(1, "Ada Okafor")];
    let newer = vec![nominee(2, "Ben Mensah")];

    let gate = Arc::new(Notify::new());
    let loader = Arc::new(GatedLoader {
        gate: Arc::clone(&gate),
        first: stale,
        later: newer.clone(),
        calls: AtomicUsize::new(0),
    });
    let controller = fixture.controller(Arc::clone(&loader));

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load().await }
    });
    wait_until(|| loader.calls.load(Ordering::SeqCst) == 1).await;

    controller.load().await;
    assert_that!(controller.state(), eq(FetchState::Success(newer.clone())));

    gate.notify_one();
    first.await.unwrap();

    // The late response of the first load must not win.
    assert_that!(controller.state(), eq(FetchState::Success(newer)));
}

#[rstest]
#[tokio::test]
async fn should_roll_back_the_optimistic_update_when_the_backend_refuses(fixture: Fixture) {

    let rows = vec![nominee(6, "Ada Okafor"), nominee(7, "Ben Mensah"), nominee(8, "Chidi Eze")];
    let loader = ScriptedLoader::new(vec![Ok(rows.clone())]);
    let controller = fixture.controller(Arc::clone(&loader));
    controller.load().await;

    let intent = MutationIntent::new(NomineeId(7), MutationKind::StatusTransition);
    let result = controller.mutate(
        intent,
        Some(Box::new(|rows: &mut Vec<Nominee>| {
            rows.retain(|row| row.id != NomineeId(7));
        })),
        || async { Err(backend_error("already approved")) },
    ).await;

    assert_that!(result, err(eq(MutateError::Backend { message: String::from("already approved") })));

    // Row 7 is back at its original position.
    assert_that!(controller.state(), eq(FetchState::Success(rows)));
}

#[rstest]
#[tokio::test]
async fn should_keep_the_optimistic_update_on_success_without_reloading(fixture: Fixture) {

    let rows = vec![nominee(7, "Ben Mensah"), nominee(8, "Chidi Eze")];
    let loader = ScriptedLoader::new(vec![Ok(rows)]);
    let controller = fixture.controller(Arc::clone(&loader));
    controller.load().await;

    let result = controller.mutate(
        MutationIntent::new(NomineeId(7), MutationKind::StatusTransition),
        Some(Box::new(|rows: &mut Vec<Nominee>| {
            rows.retain(|row| row.id != NomineeId(7));
        })),
        || async { Ok(()) },
    ).await;

    assert_that!(result, ok(anything()));
    assert_that!(controller.state(), eq(FetchState::Success(vec![nominee(8, "Chidi Eze")])));
    assert_that!(loader.calls(), eq(1));
}

#[rstest]
#[tokio::test]
async fn should_reload_after_a_mutation_without_an_optimistic_update(fixture: Fixture) {

    let before = vec![nominee(7, "Ben Mensah")];
    let after = vec![nominee(8, "Chidi Eze")];
    let loader = ScriptedLoader::new(vec![Ok(before), Ok(after.clone())]);
    let controller = fixture.controller(Arc::clone(&loader));
    controller.load().await;

    let result = controller.mutate(
        MutationIntent::new(NomineeId(7), MutationKind::Update),
        None,
        || async { Ok(()) },
    ).await;

    assert_that!(result, ok(anything()));
    assert_that!(controller.state(), eq(FetchState::Success(after)));
    assert_that!(loader.calls(), eq(2));
}

#[rstest]
#[tokio::test]
async fn should_refuse_an_unconfirmed_destructive_mutation(fixture: Fixture) {

    let rows = vec![nominee(7, "Ben Mensah")];
    let loader = ScriptedLoader::new(vec![Ok(rows.clone())]);
    let controller = fixture.controller(Arc::clone(&loader));
    controller.load().await;

    let performed = Arc::new(AtomicUsize::new(0));
    let result = controller.mutate(
        MutationIntent::new(NomineeId(7), MutationKind::Delete),
        None,
        {
            let performed = Arc::clone(&performed);
            move || async move {
                performed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        },
    ).await;

    assert_that!(result, err(eq(MutateError::ConfirmationRequired)));
    assert_that!(performed.load(Ordering::SeqCst), eq(0));
    assert_that!(controller.state(), eq(FetchState::Success(rows)));
}

#[rstest]
#[tokio::test]
async fn should_refuse_a_second_mutation_for_the_same_target_while_one_is_pending(fixture: Fixture) {

    let loader = ScriptedLoader::new(vec![Ok(vec![nominee(7, "Ben Mensah")])]);
    let controller = fixture.controller(Arc::clone(&loader));
    controller.load().await;

    let gate = Arc::new(Notify::new());

    let first = tokio::spawn({
        let controller = controller.clone();
        let gate = Arc::clone(&gate);
        async move {
            controller.mutate(
                MutationIntent::new(NomineeId(7), MutationKind::StatusTransition),
                None,
                || async move {
                    gate.notified().await;
                    Err(backend_error("too late"))
                },
            ).await
        }
    });
    wait_until(|| controller.inner.pending_mutations.lock().unwrap().contains("7")).await;

    let second = controller.mutate(
        MutationIntent::new(NomineeId(7), MutationKind::StatusTransition),
        None,
        || async { Ok(()) },
    ).await;

    assert_that!(second, err(eq(MutateError::AlreadyPending { target: String::from("7") })));

    gate.notify_one();
    let first = first.await.unwrap();
    assert_that!(first, err(anything()));

    // The slot is free again after the first mutation settled.
    assert_that!(controller.inner.pending_mutations.lock().unwrap().is_empty(), eq(true));
}

#[rstest]
#[tokio::test]
async fn should_reset_the_page_index_when_search_or_filters_change(fixture: Fixture) {

    let rows = (1..=25).map(|id| nominee(id, "Ada Okafor")).collect::<Vec<_>>();
    let loader = ScriptedLoader::new(vec![Ok(rows)]);
    let controller = fixture.controller(Arc::clone(&loader));
    controller.load().await;

    controller.set_page_index(2);
    assert_that!(controller.rows().page.index, eq(2));

    controller.set_search("ada");
    assert_that!(controller.rows().page.index, eq(0));

    controller.set_page_index(1);
    controller.set_filters(vec![Filter::new("pending-only", |nominee: &Nominee| {
        nominee.status == NomineeStatus::Pending
    })]);
    assert_that!(controller.rows().page.index, eq(0));
    assert_that!(controller.rows().total_filtered, eq(25));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn should_keep_refreshing_periodically_without_stacking(fixture: Fixture) {

    let gate = Arc::new(Notify::new());
    let loader = Arc::new(GatedLoader {
        gate: Arc::clone(&gate),
        first: vec![nominee(1, "Ada Okafor")],
        later: vec![nominee(2, "Ben Mensah")],
        calls: AtomicUsize::new(0),
    });
    let controller = fixture.controller(Arc::clone(&loader));

    let refresh = controller.spawn_auto_refresh(Duration::from_secs(10));

    tokio::time::sleep(Duration::from_secs(25)).await;
    refresh.abort();

    // Two ticks fired although the first fetch never resolved.
    assert_that!(loader.calls.load(Ordering::SeqCst), eq(2));
    assert_that!(controller.state(), eq(FetchState::Success(vec![nominee(2, "Ben Mensah")])));
}
