use std::error::Error;
use std::sync::Arc;

use showcase::counter::ViewCounter;
use showcase::dataset::{DatasetLoader, DatasetSource, DatasetState, MediaPaths};
use showcase::store::FileStore;
use showcase::surface::{drive, CurationSurface, ScriptedEvents, UiEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let workdir = std::env::temp_dir().join(format!("showcase_demo_{}", std::process::id()));
    std::fs::create_dir_all(&workdir)?;
    let dataset_path = workdir.join("projects.json");
    std::fs::write(
        &dataset_path,
        r#"{"projects":[{"id":"p1","projectTitle":"Tide Charts","fileName":"tide.png","staffPick":false}]}"#,
    )?;

    let loader = DatasetLoader::new(DatasetSource::Path(dataset_path.clone()), 5)?;
    let state = DatasetState::load(&loader).await;
    let counter = ViewCounter::new(Arc::new(FileStore::new(workdir.join("views.json"))));

    let mut surface = CurationSurface::new(
        state,
        counter,
        MediaPaths::default(),
        workdir.join("exports"),
        dataset_path.display().to_string(),
    );
    let mut events = ScriptedEvents::new([
        UiEvent::ToggleStaffPick("p1".to_string()),
        UiEvent::SaveChanges,
        UiEvent::NavigateAway,
    ]);
    drive(&mut surface, &mut events, |block| println!("{block}\n")).await;

    let exported = std::fs::read_to_string(workdir.join("exports").join("projects.json"))?;
    println!("{exported}");
    Ok(())
}
