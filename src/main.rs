use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::env;
use std::path::PathBuf;
use tracing::{error, info, warn};

use recipe_finder::app::RecipeApp;
use recipe_finder::config::AppConfig;
use recipe_finder::errors::RecipeError;
use recipe_finder::filters::{MealTypeFilter, SearchFilters, TimeWindow};
use recipe_finder::localization::{detect_language, LocalizationManager};
use recipe_finder::logging::LoggingConfig;
use recipe_finder::models::{RecipeDetail, RecipeId, RecipeSource};
use recipe_finder::nutrition::summary_lines;
use recipe_finder::planner::{hydrate_entry, MealPlanEntry, MealType, Weekday};
use recipe_finder::search::{SearchEvent, SearchRequest};
use recipe_finder::storage::Favorite;
use recipe_finder::tools::RecommendedTool;

#[derive(Parser)]
#[command(
    name = "recipe-finder",
    about = "Find recipes by ingredient, plan meals and build a shopping list",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Interface language for this run (en, es, fr, de, fi)
    #[arg(long, short = 'l', global = true, env = "RECIPE_FINDER_LANG")]
    lang: Option<String>,

    /// Debug-level logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Search recipes that use the given ingredients
    Search {
        /// Ingredient names, separated by spaces or commas
        #[arg(required = true, value_delimiter = ',')]
        ingredients: Vec<String>,

        /// Diet tags every result must carry
        #[arg(long, value_delimiter = ',')]
        diet: Vec<String>,

        #[arg(long, default_value_t = 0)]
        min_time: u32,

        #[arg(long, default_value_t = 60)]
        max_time: u32,

        /// breakfast, lunch, dinner, ... or "any"
        #[arg(long, default_value = "any")]
        meal_type: String,
    },

    /// Random recipe ideas from both sources
    Random,

    /// Show one recipe with ingredients, steps and nutrition
    Show {
        id: String,

        #[arg(long, value_enum, default_value_t = SourceArg::Spoonacular)]
        source: SourceArg,
    },

    /// List the diet tags that can be used as filters
    Diets,

    /// Recent searches, newest first
    History,

    /// Manage favorite recipes
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },

    /// Manage the weekly meal plan
    Plan {
        #[command(subcommand)]
        action: PlanCommand,
    },

    /// Group the ingredients of the meal plan, optionally exporting them
    ShoppingList {
        /// Target file; the format follows the extension (txt, csv, xml, pdf)
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show or change the saved interface language
    Language { code: Option<String> },
}

#[derive(Subcommand)]
enum FavoritesCommand {
    List,
    Add {
        id: String,

        #[arg(long, value_enum, default_value_t = SourceArg::Spoonacular)]
        source: SourceArg,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
enum PlanCommand {
    Show,
    /// Put a recipe (or a free-text title) into a slot
    Set {
        day: Weekday,
        meal: MealType,

        /// Recipe id; its ingredients are fetched right away
        #[arg(long, required_unless_present = "title", conflicts_with = "title")]
        recipe: Option<String>,

        #[arg(long, value_enum, default_value_t = SourceArg::Spoonacular)]
        source: SourceArg,

        /// Free-text meal without a linked recipe
        #[arg(long)]
        title: Option<String>,
    },
    /// Fetch the ingredients of the recipe planned in a slot
    Fetch { day: Weekday, meal: MealType },
    Remove { day: Weekday, meal: MealType },
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Spoonacular,
    Mealdb,
}

impl From<SourceArg> for RecipeSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Spoonacular => RecipeSource::Primary,
            SourceArg::Mealdb => RecipeSource::Fallback,
        }
    }
}

/// Localized output for the selected language
struct Ui {
    messages: LocalizationManager,
    lang: String,
}

impl Ui {
    fn t(&self, key: &str) -> String {
        self.messages.t(key, &self.lang)
    }

    fn t_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.messages.get_message_with_args(key, &self.lang, args)
    }

    fn error(&self, err: &RecipeError) -> String {
        self.t(err.message_key())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging = logging.with_level("debug");
    }
    logging.init()?;

    info!("Starting Recipe Finder");

    let config = AppConfig::from_env();
    let messages = LocalizationManager::new(&config.locales_dir)?;
    let app = RecipeApp::new(config)?;

    // Language preference: command line, saved setting, then the system locale
    let lang = match &cli.lang {
        Some(code) => detect_language(code),
        None => {
            let saved = app.storage().load_settings().language;
            if saved.is_empty() {
                detect_language(&env::var("LANG").unwrap_or_default())
            } else {
                detect_language(&saved)
            }
        }
    };
    let ui = Ui {
        messages,
        lang: lang.to_string(),
    };

    let result = run(cli.command, &app, &ui).await;
    if let Err(e) = &result {
        error!("Command failed: {e:#}");
    }
    result
}

async fn run(command: Command, app: &RecipeApp, ui: &Ui) -> Result<()> {
    match command {
        Command::Search {
            ingredients,
            diet,
            min_time,
            max_time,
            meal_type,
        } => {
            let filters = SearchFilters::default()
                .with_diets(&diet)
                .with_time(TimeWindow::new(min_time, max_time))
                .with_meal_type(MealTypeFilter::parse(&meal_type));
            search(app, ui, ingredients, diet, filters).await
        }
        Command::Random => {
            println!("{}", ui.t("random-title"));
            let recipes = app.home_recipes().await;
            if recipes.is_empty() {
                println!("{}", ui.t("error-source-unavailable"));
            }
            for recipe in recipes {
                println!("  [{}:{}] {}", recipe.source, recipe.id, recipe.title);
            }
            Ok(())
        }
        Command::Show { id, source } => {
            let id = RecipeId::new(&id);
            match app.details().try_get_detail(source.into(), &id).await {
                Ok(detail) => {
                    print_detail(ui, &detail, &app.recommended_tools(&detail));
                    Ok(())
                }
                Err(e) => {
                    println!("{}", ui.error(&e));
                    Err(e.into())
                }
            }
        }
        Command::Diets => {
            println!("{}", ui.t("diets-title"));
            for diet in app.diet_catalog().await.diets() {
                println!("  - {diet}");
            }
            Ok(())
        }
        Command::History => {
            let history = app.storage().load_history();
            if history.is_empty() {
                println!("{}", ui.t("no-searches"));
                return Ok(());
            }
            println!("{}", ui.t("search-history"));
            for (idx, query) in history.iter().enumerate() {
                println!("  {}. {query}", idx + 1);
            }
            Ok(())
        }
        Command::Favorites { action } => favorites(app, ui, action).await,
        Command::Plan { action } => plan(app, ui, action).await,
        Command::ShoppingList { export } => shopping_list(app, ui, export),
        Command::Language { code } => {
            let storage = app.storage();
            match code {
                Some(code) => {
                    let lang = detect_language(&code);
                    if !code.trim().to_lowercase().starts_with(lang) {
                        warn!("Unsupported language '{code}', using '{lang}'");
                    }
                    let mut settings = storage.load_settings();
                    settings.language = lang.to_string();
                    storage.save_settings(&settings)?;
                    println!("{}", ui.t_args("language-set", &[("language", lang)]));
                }
                None => {
                    println!(
                        "{}",
                        ui.t_args("language-current", &[("language", ui.lang.as_str())])
                    );
                }
            }
            Ok(())
        }
    }
}

async fn search(
    app: &RecipeApp,
    ui: &Ui,
    ingredients: Vec<String>,
    diets: Vec<String>,
    filters: SearchFilters,
) -> Result<()> {
    let request = SearchRequest::new(&ingredients).with_filters(filters);
    if request.ingredients.iter().all(|i| i.trim().is_empty()) {
        println!("{}", ui.t("ingredient-hint"));
        return Ok(());
    }

    let query = ingredients.join(", ");
    println!("{}", ui.t_args("searching", &[("ingredients", query.as_str())]));

    // Remember the query before the search so a failing search is still in history
    let storage = app.storage();
    storage.push_history(&query)?;
    let mut settings = storage.load_settings();
    settings.last_ingredients = ingredients;
    settings.last_diets = diets;
    storage.save_settings(&settings)?;

    let mut events = app.pipeline().spawn(request);
    while let Some(event) = events.recv().await {
        match event {
            SearchEvent::Candidates(count) => {
                println!("{}", ui.t_args("candidates", &[("count", count.to_string().as_str())]));
            }
            SearchEvent::Skipped { id, reason } => {
                info!("Skipped {id}: {reason:?}");
            }
            SearchEvent::Match(detail) => {
                println!("{}", ui.t_args("match-found", &[("title", detail.title.as_str())]));
                println!("    [{}:{}] {}", detail.source, detail.id, detail);
            }
            SearchEvent::Finished { matches } => {
                println!("{}", ui.t_args("results-count", &[("count", matches.to_string().as_str())]));
            }
            SearchEvent::Failed(e) => {
                println!("{}", ui.error(&e));
            }
        }
    }
    Ok(())
}

fn print_detail(ui: &Ui, detail: &RecipeDetail, tools: &[RecommendedTool]) {
    println!("{}", detail.title);
    println!(
        "{}",
        ui.t_args(
            "ready-in",
            &[
                ("minutes", detail.ready_in_minutes.to_string().as_str()),
                ("servings", detail.servings.to_string().as_str()),
            ],
        )
    );
    let summary = detail.plain_summary();
    if !summary.is_empty() {
        println!("\n{summary}");
    }

    println!("\n{}", ui.t("ingredients"));
    for line in detail.ingredient_lines() {
        println!("  - {line}");
    }

    println!("\n{}", ui.t("instructions"));
    for step in &detail.instruction_steps {
        println!("  {}. {}", step.number, step.text);
    }

    println!("\n{}", ui.t("nutrition"));
    let nutrients = summary_lines(detail);
    if nutrients.is_empty() {
        println!("  {}", ui.t("no-nutrition"));
    }
    for line in nutrients {
        println!("  {line}");
    }

    if !tools.is_empty() {
        println!("\n{}", ui.t("recommended-tools"));
        for tool in tools {
            println!("  • {} ({})", tool.name, tool.link);
        }
    }

    if !detail.source_url.is_empty() {
        println!("\n{}", ui.t_args("source-link", &[("url", detail.source_url.as_str())]));
    }
}

async fn favorites(app: &RecipeApp, ui: &Ui, action: FavoritesCommand) -> Result<()> {
    let storage = app.storage();
    match action {
        FavoritesCommand::List => {
            let favorites = storage.load_favorites();
            if favorites.is_empty() {
                println!("{}", ui.t("no-favorites"));
                return Ok(());
            }
            println!("{}", ui.t("favorites-title"));
            for favorite in favorites {
                println!(
                    "  [{}:{}] {} ({})",
                    favorite.source,
                    favorite.id,
                    favorite.title,
                    favorite.saved_at.format("%Y-%m-%d")
                );
            }
        }
        FavoritesCommand::Add { id, source } => {
            let id = RecipeId::new(&id);
            let detail = match app.details().try_get_detail(source.into(), &id).await {
                Ok(detail) => detail,
                Err(e) => {
                    println!("{}", ui.error(&e));
                    return Err(e.into());
                }
            };
            let key = if storage.add_favorite(Favorite::from_detail(&detail))? {
                "favorite-added"
            } else {
                "favorite-exists"
            };
            println!("{}", ui.t_args(key, &[("title", detail.title.as_str())]));
        }
        FavoritesCommand::Remove { id } => {
            if storage.remove_favorite(&RecipeId::new(&id))? {
                println!("{}", ui.t("favorite-removed"));
            } else {
                println!("{}", ui.t("not-found"));
            }
        }
    }
    Ok(())
}

async fn plan(app: &RecipeApp, ui: &Ui, action: PlanCommand) -> Result<()> {
    let storage = app.storage();
    let mut plan = storage.load_meal_plan();

    match action {
        PlanCommand::Show => {
            if plan.is_empty() {
                println!("{}", ui.t("plan-empty"));
                return Ok(());
            }
            println!("{}", ui.t("meal-plan"));
            for entry in plan.entries() {
                let fetched = entry
                    .ingredients
                    .as_ref()
                    .map(|lines| format!(" ({} ingredients)", lines.len()))
                    .unwrap_or_default();
                println!("  {} {}: {}{fetched}", entry.day, entry.meal_type, entry.title);
            }
            return Ok(());
        }
        PlanCommand::Set {
            day,
            meal,
            recipe,
            source,
            title,
        } => {
            let entry = match (recipe, title) {
                (Some(id), _) => {
                    let id = RecipeId::new(&id);
                    match app.details().try_get_detail(source.into(), &id).await {
                        Ok(detail) => MealPlanEntry::from_detail(day, meal, &detail),
                        Err(e) => {
                            println!("{}", ui.error(&e));
                            return Err(e.into());
                        }
                    }
                }
                (None, Some(title)) => MealPlanEntry::titled(day, meal, &title),
                (None, None) => bail!("either --recipe or --title is required"),
            };
            println!(
                "{}",
                ui.t_args(
                    "plan-set",
                    &[
                        ("title", entry.title.as_str()),
                        ("day", day.name()),
                        ("meal", meal.name()),
                    ],
                )
            );
            plan.assign(entry);
        }
        PlanCommand::Fetch { day, meal } => match hydrate_entry(&mut plan, day, meal, app.details()).await {
            Ok(count) => {
                println!(
                    "{}",
                    ui.t_args(
                        "plan-fetched",
                        &[
                            ("count", count.to_string().as_str()),
                            ("day", day.name()),
                            ("meal", meal.name()),
                        ],
                    )
                );
            }
            Err(e) => {
                println!("{}", ui.error(&e));
                return Err(e.into());
            }
        },
        PlanCommand::Remove { day, meal } => {
            if plan.remove(day, meal).is_none() {
                println!("{}", ui.t("not-found"));
                return Ok(());
            }
            println!(
                "{}",
                ui.t_args("plan-removed", &[("day", day.name()), ("meal", meal.name())])
            );
        }
        PlanCommand::Clear => {
            plan.clear();
            println!("{}", ui.t("plan-cleared"));
        }
    }

    storage.save_meal_plan(&plan)
}

fn shopping_list(app: &RecipeApp, ui: &Ui, export: Option<PathBuf>) -> Result<()> {
    let list = app.shopping_list();
    if list.is_empty() {
        println!("{}", ui.t("no-ingredients"));
        return Ok(());
    }

    println!("{}", ui.t("shopping-list"));
    for group in list.groups() {
        println!("{}:", group.canonical_key);
        for item in &group.members {
            println!("  - {item}");
        }
    }

    if let Some(path) = export {
        match list.write_to(&path) {
            Ok(_) => {
                let shown = path.display().to_string();
                println!("{}", ui.t_args("exported", &[("path", shown.as_str())]));
            }
            Err(e) => {
                println!("{}", ui.error(&e));
                return Err(e.into());
            }
        }
    }
    Ok(())
}
