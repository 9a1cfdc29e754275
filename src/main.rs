use anyhow::{bail, Context};
use serde::Serialize;

use recipe_finder::{catalog, App, Config};

const USAGE: &str = "Usage:
  recipe-finder search <query> [--cuisine C] [--type T] [--diet D] [--max N]
  recipe-finder show <id> [--servings N]
  recipe-finder cuisines | meal-types | diets";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };

    match command.as_str() {
        "cuisines" => return print_json(&catalog::CUISINES),
        "meal-types" => return print_json(&catalog::MEAL_TYPES),
        "diets" => return print_json(&catalog::DIETS),
        "search" | "show" => {}
        other => bail!("unknown command {other:?}\n{USAGE}"),
    }

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;
    let app = App::new(&config).await.context("failed to initialize")?;

    if command == "search" {
        let query = args.get(1).context("search needs a query")?;
        let mut params = app.search_params(query.as_str());
        if let Some(cuisine) = flag_value(&args, "--cuisine") {
            params = params.cuisine(cuisine);
        }
        if let Some(meal_type) = flag_value(&args, "--type") {
            params = params.meal_type(meal_type);
        }
        if let Some(diet) = flag_value(&args, "--diet") {
            params = params.diet(diet);
        }
        if let Some(max) = flag_value(&args, "--max") {
            params = params.limit(max.parse().context("--max must be a number")?);
        }

        let recipes = app.search_recipes(None, &params).await?;
        print_json(&recipes)
    } else {
        let id: i64 = args
            .get(1)
            .context("show needs a recipe id")?
            .parse()
            .context("recipe id must be an integer")?;
        let servings = flag_value(&args, "--servings")
            .map(|s| s.parse::<u32>())
            .transpose()
            .context("--servings must be a positive number")?;

        let recipe = app.recipe_details(id, servings).await?;
        print_json(&recipe)
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
