//! Operator CLI for the marketplace catalog.
//!
//! # Usage
//!
//! ```bash
//! # Dry-run the resolution of a USDL document (no database needed)
//! catalog resolve http://repo.lab.fiware.org/sampleUsdl.rdf
//!
//! # Register a user and a store
//! catalog user register --user-name alice --display-name "Alice" --email alice@example.com
//! catalog --as alice store create --display-name "FIWARE Store" --url https://store.lab.fiware.org
//!
//! # Register, refresh and remove a description
//! catalog --as alice description create fiware-store --display-name "Sample" --url http://repo.lab.fiware.org/sampleUsdl.rdf
//! catalog --as alice description refresh fiware-store sample
//! catalog --as alice description delete fiware-store sample
//!
//! # Browse offerings
//! catalog offering list --store fiware-store
//!
//! # Check database connection
//! catalog db check
//! ```
//!
//! # Environment Variables
//!
//! See [`marketplace_catalog::config`]. `DATABASE_URL` is required by every
//! command except `resolve`.

use marketplace_catalog::application::resolution::{OfferingResolver, ResolvedOfferings, SweepReport};
use marketplace_catalog::application::services::{
    DescriptionService, OfferingService, StoreService, UserService,
};
use marketplace_catalog::config::{self, Config};
use marketplace_catalog::domain::entities::{
    CreateDescription, CreateStore, Description, NewRating, NewUser, Offering, Rating,
    UpdateDescription, UpdateRating, User,
};
use marketplace_catalog::infrastructure::persistence::{
    InMemoryCatalog, PgCategoryRepository, PgDescriptionRepository, PgOfferingRepository,
    PgServiceRepository, PgStoreRepository, PgUserRepository, pool,
};
use marketplace_catalog::infrastructure::rdf::HttpModelLoader;
use marketplace_catalog::telemetry;
use marketplace_catalog::AppError;
use marketplace_catalog::utils::Page;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing the marketplace catalog.
#[derive(Parser)]
#[command(name = "catalog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// User name the command acts as (required for writes)
    #[arg(long = "as", global = true, value_name = "USER")]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Resolve the offerings of a document without storing anything
    Resolve {
        /// Document URL (http, https or file)
        url: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage stores
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },

    /// Manage descriptions
    Description {
        #[command(subcommand)]
        action: DescriptionAction,
    },

    /// Browse offerings
    Offering {
        #[command(subcommand)]
        action: OfferingAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Pagination window shared by list commands.
#[derive(Args)]
struct PageArgs {
    /// Number of items to skip
    #[arg(long, default_value_t = 0)]
    offset: i64,

    /// Maximum number of items (default: `DEFAULT_PAGE_SIZE`)
    #[arg(long)]
    max: Option<i64>,
}

impl PageArgs {
    fn page(&self, config: &Config) -> Result<Page> {
        let max = self.max.unwrap_or(config.default_page_size);
        Ok(Page::new(self.offset, max, config.max_page_size)?)
    }
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new user (prompts for missing fields)
    Register {
        #[arg(long)]
        user_name: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        company: Option<String>,
    },

    /// List all users
    List,
}

#[derive(Subcommand)]
enum StoreAction {
    /// Create a store owned by the acting user
    Create {
        #[arg(long)]
        display_name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// List stores
    List {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Delete a store with its descriptions and offerings
    Delete {
        name: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DescriptionAction {
    /// Register a description in a store and resolve its offerings
    Create {
        store: String,
        #[arg(long)]
        display_name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Update a description and re-resolve its offerings
    Update {
        store: String,
        name: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Re-resolve the offerings of a description
    Refresh { store: String, name: String },

    /// List the descriptions of a store
    List {
        store: String,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Delete a description and its offerings
    Delete {
        store: String,
        name: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum OfferingAction {
    /// List offerings, optionally scoped to a store or description
    List {
        #[arg(long)]
        store: Option<String>,

        /// Requires `--store`
        #[arg(long, requires = "store")]
        description: Option<String>,

        #[command(flatten)]
        page: PageArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rate an offering (score 0-5)
    Rate {
        store: String,
        description: String,
        offering: String,
        #[arg(long)]
        score: i32,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Change one of your ratings
    Rerate {
        store: String,
        description: String,
        offering: String,
        rating: i64,
        #[arg(long)]
        score: Option<i32>,
        #[arg(long)]
        comment: Option<String>,
    },

    /// List the ratings of an offering
    Ratings {
        store: String,
        description: String,
        offering: String,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

type PgResolver = OfferingResolver<HttpModelLoader, PgServiceRepository, PgCategoryRepository>;

/// PostgreSQL-backed services.
struct Catalog {
    users: UserService<PgUserRepository>,
    stores: StoreService<PgStoreRepository, PgDescriptionRepository>,
    descriptions: DescriptionService<PgStoreRepository, PgDescriptionRepository, PgResolver>,
    offerings: OfferingService<
        PgOfferingRepository,
        PgStoreRepository,
        PgDescriptionRepository,
        PgCategoryRepository,
    >,
}

impl Catalog {
    fn new(pool: PgPool, loader: HttpModelLoader) -> Self {
        let pool = Arc::new(pool);
        let users = Arc::new(PgUserRepository::new(pool.clone()));
        let stores = Arc::new(PgStoreRepository::new(pool.clone()));
        let descriptions = Arc::new(PgDescriptionRepository::new(pool.clone()));
        let offerings = Arc::new(PgOfferingRepository::new(pool.clone()));
        let services = Arc::new(PgServiceRepository::new(pool.clone()));
        let categories = Arc::new(PgCategoryRepository::new(pool));

        let resolver = Arc::new(OfferingResolver::new(
            Arc::new(loader),
            services,
            categories.clone(),
        ));

        Self {
            users: UserService::new(users),
            stores: StoreService::new(stores.clone(), descriptions.clone()),
            descriptions: DescriptionService::new(stores.clone(), descriptions.clone(), resolver),
            offerings: OfferingService::new(offerings, stores, descriptions, categories),
        }
    }

    async fn actor(&self, actor: Option<&str>) -> Result<User> {
        let name = actor.context("This command requires --as <user>")?;
        self.users
            .get(name)
            .await
            .with_context(|| format!("Unknown acting user '{name}'"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let result = run(cli).await;

    if let Err(ref e) = result
        && let Some(app_error) = e.downcast_ref::<AppError>()
    {
        eprintln!("{}", serde_json::to_string_pretty(&app_error.info())?);
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_from_env()?;
    telemetry::init(&config.log_level, &config.log_format)?;
    config.print_summary();

    let loader = HttpModelLoader::new(&config.fetch)?;

    if let Commands::Resolve { url, json } = &cli.command {
        return handle_resolve(loader, url, *json).await;
    }

    let pool = pool::connect(&config).await?;

    if let Commands::Db { action } = &cli.command {
        return handle_db_action(action, &pool).await;
    }

    let catalog = Catalog::new(pool, loader);
    let actor = cli.actor.as_deref();

    match cli.command {
        Commands::User { action } => handle_user_action(action, &catalog, actor).await?,
        Commands::Store { action } => {
            handle_store_action(action, &catalog, actor, &config).await?
        }
        Commands::Description { action } => {
            handle_description_action(action, &catalog, actor, &config).await?
        }
        Commands::Offering { action } => {
            handle_offering_action(action, &catalog, actor, &config).await?
        }
        Commands::Resolve { .. } | Commands::Db { .. } => {}
    }

    Ok(())
}

/// Resolves a document against an empty catalog and prints the offerings.
async fn handle_resolve(loader: HttpModelLoader, url: &str, json: bool) -> Result<()> {
    let empty = Arc::new(InMemoryCatalog::new());
    let resolver = OfferingResolver::new(Arc::new(loader), empty.clone(), empty);

    let resolved = resolver
        .resolve_url(url)
        .await
        .map_err(AppError::from)
        .with_context(|| format!("Failed to resolve {url}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    print_resolved(url, &resolved);
    Ok(())
}

fn print_resolved(url: &str, resolved: &ResolvedOfferings) {
    println!("{} {}", "🔎 Resolved".bright_blue().bold(), url.cyan());
    println!();

    if resolved.is_empty() {
        println!("{}", "  No offerings found".yellow());
        return;
    }

    print_offerings(&resolved.offerings);

    println!("  {}", "Services:".bright_white().bold());
    for service in resolved.services.values() {
        println!(
            "    {} {}",
            service.uri.cyan(),
            service.display_name.as_deref().unwrap_or("").bright_black()
        );
    }
    println!("  {}", "Categories:".bright_white().bold());
    for category in resolved.categories.values() {
        println!(
            "    {:<30} {}",
            category.name.cyan(),
            category.display_name.bright_black()
        );
    }
    println!();
}

fn print_ratings(ratings: &[Rating]) {
    for rating in ratings {
        println!(
            "  #{:<6} {}/5  user {:<6} {}",
            rating.id.to_string().cyan(),
            rating.score.to_string().bright_green().bold(),
            rating.user_id,
            rating.comment.as_deref().unwrap_or("").bright_black()
        );
    }
}

fn print_offerings(offerings: &[Offering]) {
    println!(
        "  {:<30} {:<10} {:<6} {:<6} {}",
        "Name".bright_white().bold(),
        "Version".bright_white().bold(),
        "Svc".bright_white().bold(),
        "Plans".bright_white().bold(),
        "URI".bright_white().bold()
    );
    println!("  {}", "─".repeat(90).bright_black());

    for offering in offerings {
        println!(
            "  {:<30} {:<10} {:<6} {:<6} {}",
            offering.name.cyan(),
            offering.version.as_deref().unwrap_or("-"),
            offering.services.len(),
            offering.price_plans.len(),
            offering.uri.bright_black()
        );
    }

    println!();
    println!(
        "  Total: {}",
        offerings.len().to_string().bright_white().bold()
    );
    println!();
}

fn print_sweep(report: &SweepReport) {
    if report.is_empty() {
        return;
    }
    for uri in &report.deleted_services {
        println!("  {} service {}", "swept".bright_black(), uri.cyan());
    }
    for name in &report.deleted_categories {
        println!("  {} category {}", "swept".bright_black(), name.cyan());
    }
}

fn print_description(description: &Description) {
    println!("  Name:      {}", description.name.cyan());
    println!("  URL:       {}", description.url.bright_black());
    println!(
        "  Offerings: {}",
        description.offerings.len().to_string().bright_green().bold()
    );
    println!();
}

fn prompt_missing(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

fn confirm(prompt: &str, skip: bool) -> Result<bool> {
    if skip {
        return Ok(true);
    }

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
    }
    Ok(confirmed)
}

async fn handle_user_action(
    action: UserAction,
    catalog: &Catalog,
    actor: Option<&str>,
) -> Result<()> {
    match action {
        UserAction::Register {
            user_name,
            display_name,
            email,
            company,
        } => {
            let new_user = NewUser {
                user_name: prompt_missing(user_name, "User name")?,
                display_name: prompt_missing(display_name, "Display name")?,
                email: prompt_missing(email, "Email")?,
                company,
            };

            let user = catalog
                .users
                .register(new_user)
                .await
                .context("Failed to register user")?;

            println!("{}", "✅ User registered".green().bold());
            println!("  User:  {}", user.user_name.cyan());
            println!("  Email: {}", user.email.bright_black());
        }
        UserAction::List => {
            let users = catalog.users.list().await?;
            if users.is_empty() {
                println!("{}", "  No users found".yellow());
                return Ok(());
            }

            for user in &users {
                let marker = if Some(user.user_name.as_str()) == actor {
                    "*".bright_green()
                } else {
                    " ".normal()
                };
                println!(
                    "{} {:<30} {:<40} {}",
                    marker,
                    user.user_name.cyan(),
                    user.email,
                    user.registered_at
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                        .bright_black()
                );
            }
        }
    }

    Ok(())
}

async fn handle_store_action(
    action: StoreAction,
    catalog: &Catalog,
    actor: Option<&str>,
    config: &Config,
) -> Result<()> {
    match action {
        StoreAction::Create {
            display_name,
            url,
            comment,
        } => {
            let actor = catalog.actor(actor).await?;
            let store = catalog
                .stores
                .create(
                    &actor,
                    CreateStore {
                        display_name,
                        url,
                        comment,
                    },
                )
                .await
                .context("Failed to create store")?;

            println!("{}", "✅ Store created".green().bold());
            println!("  Name: {}", store.name.cyan());
        }
        StoreAction::List { page } => {
            let stores = catalog.stores.list(page.page(config)?).await?;
            if stores.is_empty() {
                println!("{}", "  No stores found".yellow());
                return Ok(());
            }

            for store in &stores {
                println!(
                    "  {:<30} {:<40} {}",
                    store.name.cyan(),
                    store.url,
                    store.display_name.bright_black()
                );
            }
        }
        StoreAction::Delete { name, yes } => {
            let actor = catalog.actor(actor).await?;
            println!("  Store: {}", name.cyan());
            if !confirm("Delete this store with all its descriptions?", yes)? {
                return Ok(());
            }

            let report = catalog
                .stores
                .delete(&actor, &name)
                .await
                .context("Failed to delete store")?;

            println!("{}", "✅ Store deleted".green().bold());
            print_sweep(&report);
        }
    }

    Ok(())
}

async fn handle_description_action(
    action: DescriptionAction,
    catalog: &Catalog,
    actor: Option<&str>,
    config: &Config,
) -> Result<()> {
    match action {
        DescriptionAction::Create {
            store,
            display_name,
            url,
            comment,
        } => {
            let actor = catalog.actor(actor).await?;
            let description = catalog
                .descriptions
                .create(
                    &actor,
                    &store,
                    CreateDescription {
                        display_name,
                        url,
                        comment,
                    },
                )
                .await
                .context("Failed to create description")?;

            println!("{}", "✅ Description created".green().bold());
            print_description(&description);
        }
        DescriptionAction::Update {
            store,
            name,
            display_name,
            url,
            comment,
        } => {
            let actor = catalog.actor(actor).await?;
            let description = catalog
                .descriptions
                .update(
                    &actor,
                    &store,
                    &name,
                    UpdateDescription {
                        display_name,
                        url,
                        comment,
                    },
                )
                .await
                .context("Failed to update description")?;

            println!("{}", "✅ Description updated".green().bold());
            print_description(&description);
        }
        DescriptionAction::Refresh { store, name } => {
            let actor = catalog.actor(actor).await?;
            let description = catalog
                .descriptions
                .refresh(&actor, &store, &name)
                .await
                .context("Failed to refresh description")?;

            println!("{}", "✅ Description refreshed".green().bold());
            print_description(&description);
        }
        DescriptionAction::List { store, page } => {
            let descriptions = catalog
                .descriptions
                .list(&store, page.page(config)?)
                .await?;
            if descriptions.is_empty() {
                println!("{}", "  No descriptions found".yellow());
                return Ok(());
            }

            for description in &descriptions {
                println!(
                    "  {:<30} {:<4} {}",
                    description.name.cyan(),
                    description.offerings.len(),
                    description.url.bright_black()
                );
            }
        }
        DescriptionAction::Delete { store, name, yes } => {
            let actor = catalog.actor(actor).await?;
            println!("  Description: {}", name.cyan());
            if !confirm("Delete this description and its offerings?", yes)? {
                return Ok(());
            }

            let report = catalog
                .descriptions
                .delete(&actor, &store, &name)
                .await
                .context("Failed to delete description")?;

            println!("{}", "✅ Description deleted".green().bold());
            print_sweep(&report);
        }
    }

    Ok(())
}

async fn handle_offering_action(
    action: OfferingAction,
    catalog: &Catalog,
    actor: Option<&str>,
    config: &Config,
) -> Result<()> {
    match action {
        OfferingAction::List {
            store,
            description,
            page,
            json,
        } => {
            let page = page.page(config)?;
            let offerings = match (store, description) {
                (Some(store), Some(description)) => {
                    catalog
                        .offerings
                        .list_by_description(&store, &description, page)
                        .await?
                }
                (Some(store), None) => catalog.offerings.list_by_store(&store, page).await?,
                _ => catalog.offerings.list(page).await?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&offerings)?);
                return Ok(());
            }

            println!("{}", "📋 Offerings".bright_blue().bold());
            println!();
            print_offerings(&offerings);
        }
        OfferingAction::Rate {
            store,
            description,
            offering,
            score,
            comment,
        } => {
            let actor = catalog.actor(actor).await?;
            let rating = catalog
                .offerings
                .create_rating(
                    &actor,
                    &store,
                    &description,
                    &offering,
                    NewRating { score, comment },
                )
                .await
                .context("Failed to rate offering")?;

            println!("{}", "✅ Offering rated".green().bold());
            print_ratings(std::slice::from_ref(&rating));
        }
        OfferingAction::Rerate {
            store,
            description,
            offering,
            rating,
            score,
            comment,
        } => {
            let actor = catalog.actor(actor).await?;
            let rating = catalog
                .offerings
                .update_rating(
                    &actor,
                    &store,
                    &description,
                    &offering,
                    rating,
                    UpdateRating { score, comment },
                )
                .await
                .context("Failed to update rating")?;

            println!("{}", "✅ Rating updated".green().bold());
            print_ratings(std::slice::from_ref(&rating));
        }
        OfferingAction::Ratings {
            store,
            description,
            offering,
        } => {
            let ratings = catalog
                .offerings
                .ratings(&store, &description, &offering)
                .await?;
            if ratings.is_empty() {
                println!("{}", "  No ratings yet".yellow());
                return Ok(());
            }
            print_ratings(&ratings);
        }
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: &DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            let stores: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores")
                .fetch_one(pool)
                .await?;
            let offerings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offerings")
                .fetch_one(pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  Stores:    {}", stores.to_string().bright_green().bold());
            println!("  Offerings: {}", offerings.to_string().bright_green().bold());
        }
    }

    Ok(())
}
