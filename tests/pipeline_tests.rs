//! # Search Pipeline Tests
//!
//! End-to-end searches through the application wiring, with both recipe
//! sources served by mock HTTP servers.

use anyhow::Result;
use recipe_finder::app::{RecipeApp, HOME_CACHE_FILE};
use recipe_finder::config::{AppConfig, SourceConfig};
use recipe_finder::errors::RecipeError;
use recipe_finder::filters::{SearchFilters, TimeWindow};
use recipe_finder::models::RecipeSource;
use recipe_finder::search::{SearchEvent, SearchRequest, SkipReason};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    primary: MockServer,
    fallback: MockServer,
    data: TempDir,
}

impl Harness {
    async fn start() -> Self {
        Self {
            primary: MockServer::start().await,
            fallback: MockServer::start().await,
            data: TempDir::new().expect("temp dir"),
        }
    }

    fn app(&self) -> RecipeApp {
        let mut config = AppConfig::default();
        config.primary = SourceConfig::spoonacular()
            .with_base_url(&self.primary.uri())
            .with_api_key("test-key");
        config.fallback = SourceConfig::mealdb().with_base_url(&self.fallback.uri());
        config.search.shuffle = false;
        config.search.blocklist = vec!["foodista".to_string()];
        config.data_dir = self.data.path().to_path_buf();
        RecipeApp::new(config).expect("app")
    }
}

fn spoonacular_detail(id: u64, title: &str, minutes: u32, source_url: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "readyInMinutes": minutes,
        "servings": 4,
        "sourceUrl": source_url,
        "vegetarian": true,
        "extendedIngredients": [{"original": "2 cups rice"}],
        "instructions": "Cook the rice. Serve."
    })
}

fn meal(id: &str, name: &str) -> serde_json::Value {
    json!({
        "idMeal": id,
        "strMeal": name,
        "strMealThumb": format!("https://img.example/{id}.jpg"),
        "strInstructions": "Boil the rice. Add the beans.",
        "strIngredient1": "Rice",
        "strIngredient2": "Beans"
    })
}

async fn mount_primary_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/recipes/findByIngredients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Foodista Rice"},
            {"id": 2, "title": "Quick Rice Bowl"},
            {"id": 3, "title": "Vanished Rice"},
            {"id": 4, "title": "Slow Rice Pudding"}
        ])))
        .mount(server)
        .await;

    let details = [
        (1, spoonacular_detail(1, "Foodista Rice", 20, "http://www.foodista.com/recipe/1")),
        (2, spoonacular_detail(2, "Quick Rice Bowl", 20, "https://blog.example/bowl")),
        (4, spoonacular_detail(4, "Slow Rice Pudding", 180, "https://blog.example/pudding")),
    ];
    for (id, body) in details {
        Mock::given(method("GET"))
            .and(path(format!("/recipes/{id}/information")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/recipes/3/information"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

async fn mount_fallback_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meals": [meal("52777", "Rice and Beans")]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_skips_blocklisted_unresolvable_and_filtered() -> Result<()> {
    let harness = Harness::start().await;
    mount_primary_search(&harness.primary).await;
    mount_fallback_search(&harness.fallback).await;

    let app = harness.app();
    let request = SearchRequest::new(&["Rice"]);
    let matches = app.pipeline().run(&request).await?;

    let titles: Vec<&str> = matches.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Quick Rice Bowl", "Rice and Beans"]);
    assert_eq!(matches[1].source, RecipeSource::Fallback);

    Ok(())
}

#[tokio::test]
async fn test_spawned_search_reports_every_skip() -> Result<()> {
    let harness = Harness::start().await;
    mount_primary_search(&harness.primary).await;
    mount_fallback_search(&harness.fallback).await;

    let app = harness.app();
    let mut events = app.pipeline().spawn(SearchRequest::new(&["rice"]));

    let mut skipped = Vec::new();
    let mut matched = Vec::new();
    let mut candidates = None;
    let mut finished = None;
    while let Some(event) = events.recv().await {
        match event {
            SearchEvent::Candidates(count) => candidates = Some(count),
            SearchEvent::Skipped { id, reason } => skipped.push((id.to_string(), reason)),
            SearchEvent::Match(detail) => matched.push(detail.id.to_string()),
            SearchEvent::Finished { matches } => finished = Some(matches),
            SearchEvent::Failed(e) => panic!("search failed: {e}"),
        }
    }

    assert_eq!(candidates, Some(5));
    assert_eq!(
        skipped,
        vec![
            ("1".to_string(), SkipReason::Blocklisted),
            ("3".to_string(), SkipReason::Unresolvable),
            ("4".to_string(), SkipReason::Filtered),
        ]
    );
    assert_eq!(matched, vec!["2", "52777"]);
    assert_eq!(finished, Some(2));

    Ok(())
}

#[tokio::test]
async fn test_failing_primary_is_contained() -> Result<()> {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/recipes/findByIngredients"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&harness.primary)
        .await;
    mount_fallback_search(&harness.fallback).await;

    let app = harness.app();
    let matches = app.pipeline().run(&SearchRequest::new(&["rice"])).await?;

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].title, "Rice and Beans");

    Ok(())
}

#[tokio::test]
async fn test_filters_that_reject_everything_report_no_matches() {
    let harness = Harness::start().await;
    mount_primary_search(&harness.primary).await;
    mount_fallback_search(&harness.fallback).await;

    let app = harness.app();
    let request = SearchRequest::new(&["rice"]).with_filters(
        SearchFilters::default()
            .with_diets(["vegan"])
            .with_time(TimeWindow::new(0, 60)),
    );

    assert_eq!(
        app.pipeline().run(&request).await,
        Err(RecipeError::NoMatches)
    );
}

#[tokio::test]
async fn test_empty_query_issues_no_requests() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.primary)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.fallback)
        .await;

    let app = harness.app();
    let request = SearchRequest::new(&["  ", ""]);
    assert_eq!(
        app.pipeline().run(&request).await,
        Err(RecipeError::NoMatches)
    );
}

#[tokio::test]
async fn test_home_recipes_are_cached() -> Result<()> {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/recipes/random"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recipes": (1..=8).map(|id| json!({"id": id, "title": format!("Idea {id}")})).collect::<Vec<_>>()
        })))
        .expect(1)
        .mount(&harness.primary)
        .await;

    let app = harness.app();
    let first = app.home_recipes().await;
    let second = app.home_recipes().await;

    assert_eq!(first.len(), 8);
    assert_eq!(first, second);
    assert!(harness.data.path().join(HOME_CACHE_FILE).exists());

    // A separate run reads the cache file instead of calling out again
    let next_run = harness.app().home_recipes().await;
    assert_eq!(next_run, first);

    Ok(())
}

#[tokio::test]
async fn test_empty_home_recipes_are_not_cached() -> Result<()> {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/recipes/random"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&harness.primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/random.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.fallback)
        .await;

    assert!(harness.app().home_recipes().await.is_empty());
    assert!(!harness.data.path().join(HOME_CACHE_FILE).exists());
    assert!(harness.app().home_recipes().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_random_tops_up_from_fallback() -> Result<()> {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/recipes/random"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/random.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meals": [meal("52777", "Rice and Beans")]
        })))
        .mount(&harness.fallback)
        .await;

    let app = harness.app();
    let picks = app.home_recipes().await;

    assert!(!picks.is_empty());
    assert!(picks.iter().all(|p| p.source == RecipeSource::Fallback));

    Ok(())
}

#[tokio::test]
async fn test_diet_catalog_cached_after_successful_probe() -> Result<()> {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/recipes/complexSearch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&harness.primary)
        .await;

    let app = harness.app();
    let catalog = app.diet_catalog().await;
    assert!(catalog.contains("vegan"));
    assert!(harness.data.path().join("diets_cache.json").exists());

    // Second load comes from the cache file, not the probe
    let again = app.diet_catalog().await;
    assert_eq!(catalog, again);

    Ok(())
}
