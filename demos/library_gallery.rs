use std::error::Error;
use std::sync::Arc;

use showcase::counter::ViewCounter;
use showcase::dataset::{Dataset, DatasetState, MediaPaths};
use showcase::filter::FilterCriteria;
use showcase::store::MemoryStore;
use showcase::surface::{GallerySurface, Surface};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let dataset = Dataset::from_json(
        r#"{"projects":[
            {"id":"p1","firstName":"Ana","lastName":"Diaz","projectTitle":"Tide Charts","projectType":"Poster","category":"Science","year":"2023","fileName":"tide.png","staffPick":false},
            {"id":"p2","firstName":"Ben","lastName":"Okafor","projectTitle":"Paper Cities","projectType":"Report","category":"Design","year":"2024","fileName":"cities.pdf","staffPick":true}
        ]}"#,
    )?;
    let store = Arc::new(MemoryStore::with_entries([("views/p2", 41)]));

    let mut gallery = GallerySurface::new(
        DatasetState::Ready(dataset),
        ViewCounter::new(store),
        MediaPaths::default(),
    )
    .with_criteria(FilterCriteria {
        year: "2024".to_string(),
        ..Default::default()
    });
    gallery.start().await;
    gallery.open_project("p2").await;

    println!("{}", gallery.render());
    println!("{}", gallery.results_summary());
    for record in gallery.records() {
        println!("{} {:?}", record.id, record.views);
    }
    Ok(())
}
