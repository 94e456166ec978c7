use std::error::Error;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use showcase::counter::{IncrementMode, ViewCounter};
use showcase::dataset::{Dataset, DatasetState, MediaPaths};
use showcase::store::MemoryStore;
use showcase::surface::{drive, ScriptedEvents, UiEvent, ViewerSurface};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let dataset = Dataset::from_json(
        r#"{"projects":[
            {"id":"a","projectTitle":"Tide Charts","fileName":"tide.png"},
            {"id":"b","projectTitle":"Paper Cities","fileName":"cities.pdf","staffPick":true},
            {"id":"c","projectTitle":"Quiet Rooms","fileName":"rooms.jpg"}
        ]}"#,
    )?;
    let store = Arc::new(MemoryStore::with_atomic_add());
    let counter = ViewCounter::new(store.clone()).with_mode(IncrementMode::Atomic);

    let mut viewer = ViewerSurface::new(DatasetState::Ready(dataset), counter, MediaPaths::default())
        .with_rng(StdRng::seed_from_u64(2024));
    let mut events = ScriptedEvents::new([UiEvent::ShowAnother, UiEvent::ShowAnother]);
    drive(&mut viewer, &mut events, |block| println!("{block}\n")).await;

    for (key, views) in store.snapshot().await {
        println!("{key}: {views}");
    }
    Ok(())
}
