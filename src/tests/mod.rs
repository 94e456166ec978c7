use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::BufReader;

use crate::counter::{CounterReading, IncrementMode, ViewCounter};
use crate::curation::CurationState;
use crate::dataset::{Dataset, DatasetLoader, DatasetSource, DatasetState, MediaPaths};
use crate::filter::{apply_filters, FilterCriteria, FilterField, StaffPickGate};
use crate::store::{CounterStore, FileStore, MemoryStore, StoreError};
use crate::surface::{
    drive, CurationSurface, GallerySurface, LineEvents, ScriptedEvents, Surface, UiEvent,
    ViewerSurface, LOAD_ERROR_MESSAGE,
};

const GALLERY: &str = r#"{
    "projects": [
        {"id":"p1","firstName":"Ana","lastName":"Diaz","projectTitle":"Tide Charts","projectType":"Poster","category":"Science","year":"2023","fileName":"tide.png","staffPick":false},
        {"id":"p2","firstName":"Ben","lastName":"Okafor","projectTitle":"Paper Cities","projectType":"Report","category":"Design","year":"2024","fileName":"cities.pdf","staffPick":true},
        {"id":"p3","firstName":"Cleo","lastName":"Tanaka","projectTitle":"Quiet Rooms","projectType":"Poster","category":"Design","year":"2024","fileName":"rooms.jpg","staffPick":false},
        {"id":"p4","firstName":"Dev","lastName":"Ross","projectTitle":"City Birds","projectType":"Video","category":"Science","year":"2024","fileName":"birds.png","staffPick":true}
    ],
    "generatedBy": "intake-form"
}"#;

fn gallery_dataset() -> Dataset {
    Dataset::from_json(GALLERY).unwrap()
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("showcase-it-{}-{name}", std::process::id()))
}

/// Holds every read value for a while, so concurrent increments both read
/// before either writes.
struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
}

#[async_trait]
impl CounterStore for SlowStore {
    fn backend_tag(&self) -> &'static str {
        "slow"
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let value = self.inner.get(key).await;
        tokio::time::sleep(self.delay).await;
        value
    }

    async fn set(&self, key: &str, value: u64) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    async fn list(&self, namespace: &str) -> Result<BTreeMap<String, u64>, StoreError> {
        self.inner.list(namespace).await
    }
}

#[test]
fn filters_preserve_order_and_are_idempotent() {
    let dataset = gallery_dataset();
    let criteria = FilterCriteria {
        search: "CIT".to_string(),
        year: "2024".to_string(),
        ..Default::default()
    };
    let once: Vec<&str> = apply_filters(&dataset.projects, &criteria)
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(once, vec!["p2", "p4"]);

    let narrowed: Vec<_> = dataset
        .projects
        .iter()
        .filter(|p| once.contains(&p.id.as_str()))
        .cloned()
        .collect();
    let twice: Vec<&str> = apply_filters(&narrowed, &criteria)
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(once, twice);

    let mut staff = FilterCriteria::default();
    staff.set(FilterField::StaffPick, "yes").unwrap();
    assert_eq!(staff.staff_pick, StaffPickGate::Yes);
    assert_eq!(apply_filters(&dataset.projects, &staff).len(), 2);
}

#[tokio::test]
async fn opening_twice_counts_one_then_two_and_leaves_others_alone() {
    let dataset = Dataset::from_json(
        r#"{"projects":[{"id":"a","fileName":"a.png"},{"id":"b","fileName":"b.png"}]}"#,
    )
    .unwrap();
    let store = Arc::new(MemoryStore::new());
    let mut gallery = GallerySurface::new(
        DatasetState::Ready(dataset),
        ViewCounter::new(store.clone()),
        MediaPaths::default(),
    );

    assert_eq!(gallery.open_project("a").await, Some(CounterReading::Count(1)));
    gallery.close_project();
    assert_eq!(gallery.open_project("a").await, Some(CounterReading::Count(2)));

    let stored = store.snapshot().await;
    assert_eq!(stored.get("views/a"), Some(&2));
    assert!(!stored.contains_key("views/b"));
}

#[tokio::test]
async fn concurrent_increments_can_lose_an_update() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::new(),
        delay: Duration::from_millis(20),
    });
    let counter = ViewCounter::new(store.clone());

    let (first, second) = tokio::join!(counter.try_increment("p1"), counter.try_increment("p1"));
    assert_eq!(first.unwrap(), 1);
    assert_eq!(second.unwrap(), 1);
    assert_eq!(store.inner.snapshot().await.get("views/p1"), Some(&1));
}

#[tokio::test]
async fn atomic_mode_counts_every_concurrent_view() {
    let store = Arc::new(MemoryStore::with_atomic_add());
    let counter = ViewCounter::new(store.clone()).with_mode(IncrementMode::Atomic);
    let (a, b) = tokio::join!(counter.increment_counter("p1"), counter.increment_counter("p1"));
    let mut seen = [a.or_zero(), b.or_zero()];
    seen.sort_unstable();
    assert_eq!(seen, [1, 2]);
}

#[tokio::test]
async fn atomic_mode_falls_back_on_plain_backends() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::new(),
        delay: Duration::from_millis(1),
    });
    let counter = ViewCounter::new(store.clone()).with_mode(IncrementMode::Atomic);
    assert_eq!(counter.increment_counter("p9").await, CounterReading::Count(1));
    assert_eq!(counter.increment_counter("p9").await, CounterReading::Count(2));
}

#[tokio::test]
async fn gallery_session_driven_by_stdin_lines() {
    let store = Arc::new(MemoryStore::with_entries([("views/p3", 5)]));
    let mut gallery = GallerySurface::new(
        DatasetState::Ready(gallery_dataset()),
        ViewCounter::new(store.clone()),
        MediaPaths::default(),
    );
    let input: &[u8] = b"type Poster\nbogus\n\ncategory Design\nopen p3\nclose\nclear\nquit\nsearch never\n";
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    let mut events = LineEvents::new(BufReader::new(input))
        .on_error(move |e| sink.lock().unwrap().push(e));

    let mut blocks = Vec::new();
    drive(&mut gallery, &mut events, |b| blocks.push(b)).await;

    assert_eq!(errors.lock().unwrap().len(), 1);
    assert!(blocks.iter().any(|b| b.contains("Showing 1 of 4 projects")));
    assert!(gallery.criteria().is_empty());
    assert_eq!(gallery.visible_projects().unwrap().len(), 4);
    assert_eq!(store.snapshot().await.get("views/p3"), Some(&6));
    // quit stops before the trailing search is applied
    assert!(gallery.criteria().search.is_empty());
}

#[tokio::test]
async fn spotlight_never_repeats_and_counts_each_showing() {
    let store = Arc::new(MemoryStore::new());
    let mut viewer = ViewerSurface::new(
        DatasetState::Ready(gallery_dataset()),
        ViewCounter::new(store.clone()),
        MediaPaths::default(),
    )
    .with_rng(StdRng::seed_from_u64(7));
    let mut events = ScriptedEvents::new(std::iter::repeat(UiEvent::ShowAnother).take(20));
    let mut rendered = 0usize;
    drive(&mut viewer, &mut events, |_| rendered += 1).await;

    assert_eq!(rendered, 21);
    let total: u64 = store.snapshot().await.values().sum();
    assert_eq!(total, 21);
    assert_eq!(viewer.stats().unwrap().staff_picks, 2);
}

#[tokio::test]
async fn curation_export_round_trips_through_the_loader() {
    let export_dir = temp_path("export");
    let mut surface = CurationSurface::new(
        DatasetState::Ready(gallery_dataset()),
        ViewCounter::new(Arc::new(MemoryStore::new())),
        MediaPaths::default(),
        export_dir.clone(),
        "./projects.json",
    );
    let mut events = ScriptedEvents::new([
        UiEvent::ToggleStaffPick("p1".to_string()),
        UiEvent::ToggleStaffPick("p2".to_string()),
        UiEvent::ToggleStaffPick("p2".to_string()),
        UiEvent::SaveChanges,
        UiEvent::NavigateAway,
    ]);
    let mut notices = Vec::new();
    drive(&mut surface, &mut events, |b| notices.push(b)).await;
    assert!(notices.iter().any(|n| n.contains("Replace ./projects.json")));

    let loader = DatasetLoader::new(
        DatasetSource::Path(export_dir.join("projects.json")),
        5,
    )
    .unwrap();
    let reloaded = loader.load().await.unwrap();
    let mut expected = gallery_dataset();
    expected.get_mut("p1").unwrap().staff_pick = true;
    assert_eq!(reloaded, expected);
    assert_eq!(reloaded.extra.get("generatedBy").and_then(|v| v.as_str()), Some("intake-form"));
    let _ = std::fs::remove_dir_all(&export_dir);
}

#[test]
fn single_toggle_exports_true_flag() {
    let mut state = CurationState::new(
        Dataset::from_json(r#"{"projects":[{"id":"p1","staffPick":false}]}"#).unwrap(),
    );
    state.toggle_staff_pick("p1");
    let artifact = state.export().unwrap();
    let json: serde_json::Value = serde_json::from_str(&artifact.contents).unwrap();
    assert_eq!(json["projects"][0]["id"], "p1");
    assert_eq!(json["projects"][0]["staffPick"], true);
}

#[tokio::test]
async fn file_store_keeps_counts_between_sessions() {
    let path = temp_path("views.json");
    let _ = std::fs::remove_file(&path);

    for _ in 0..2 {
        let counter = ViewCounter::new(Arc::new(FileStore::new(path.clone())));
        let mut gallery = GallerySurface::new(
            DatasetState::Ready(gallery_dataset()),
            counter,
            MediaPaths::default(),
        );
        gallery.start().await;
        gallery.open_project("p4").await;
    }

    let counter = ViewCounter::new(Arc::new(FileStore::new(path.clone())));
    assert_eq!(counter.read_counter("p4").await, CounterReading::Count(2));
    assert_eq!(counter.aggregate_all_counters().await, CounterReading::Count(2));
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn store_outage_degrades_every_surface_without_aborting() {
    let store = Arc::new(MemoryStore::new());
    store.fail_reads.store(true, Ordering::Relaxed);
    store.fail_writes.store(true, Ordering::Relaxed);
    let counter = ViewCounter::new(store);

    let mut viewer = ViewerSurface::new(
        DatasetState::Ready(gallery_dataset()),
        counter.clone(),
        MediaPaths::default(),
    );
    viewer.start().await;
    assert_eq!(viewer.stats().unwrap().total_views, CounterReading::Unavailable);
    assert!(viewer.featured().is_some());

    let mut curation = CurationSurface::new(
        DatasetState::Ready(gallery_dataset()),
        counter,
        MediaPaths::default(),
        temp_path("unused"),
        "projects.json",
    );
    curation.start().await;
    assert_eq!(curation.views("p2"), Some(0));
    let (_, notices) = curation.handle(UiEvent::ToggleStaffPick("p2".to_string())).await;
    assert!(notices.is_empty());
}

#[tokio::test]
async fn missing_dataset_renders_the_load_error() {
    let loader = DatasetLoader::new(DatasetSource::Path(temp_path("absent.json")), 5).unwrap();
    let state = DatasetState::load(&loader).await;
    assert!(matches!(state, DatasetState::Failed(_)));

    let gallery = GallerySurface::new(
        state,
        ViewCounter::new(Arc::new(MemoryStore::new())),
        MediaPaths::default(),
    );
    assert!(gallery.visible_projects().is_none());
    assert_eq!(gallery.render(), LOAD_ERROR_MESSAGE);
}
