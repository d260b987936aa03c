//! Wayfarer CLI
//!
//! Command-line client for the Wayfarer backend:
//! - Browse and rate cities
//! - List and report incidents
//! - Manage the home location and mobile number
//! - Join a city's chat room

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wayfarer::api::{recover, ApiClient};
use wayfarer::catalog::listing::{self, FilterQuery, ALL_CATEGORIES};
use wayfarer::chat::{ChatConnectionManager, ChatMessage, ReconnectPolicy, RoomId, WsConnector};
use wayfarer::config::{generate_default_config, Config};
use wayfarer::map::{self, Coordinate, IncidentDraft, IncidentKind};
use wayfarer::profile::{profile_owner, ProfileUpdate, SelectedLocation};
use wayfarer::rating::{RatingCategory, RatingDraft};
use wayfarer::session::{ChatUser, Session, GUEST_NAME};
use wayfarer::SortKey;

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "City rankings, community chat and incident reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// REST backend URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Chat WebSocket URL
    #[arg(long, global = true)]
    pub ws_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List ranked cities
    Cities {
        /// Case-insensitive search over name and description
        #[arg(short, long, default_value = "")]
        search: String,
        /// Only cities in this category
        #[arg(short = 'C', long, default_value = ALL_CATEGORIES)]
        category: String,
        /// Sort order (rank, rating, name, reviews)
        #[arg(long, default_value = "rank")]
        sort: SortKey,
    },

    /// Show one city
    City {
        /// City slug
        slug: String,
    },

    /// Rate a city
    Rate {
        /// City id
        city_id: String,
        /// Scores in category=value format (e.g. safety=5); unset ones are 3
        #[arg(short, long)]
        score: Vec<String>,
        /// Optional review text
        #[arg(short, long)]
        review: Option<String>,
    },

    /// List reported incidents
    Incidents {
        /// Case-insensitive search over type and description
        #[arg(short, long, default_value = "")]
        search: String,
        /// Print map widget markers as JSON instead of a table
        #[arg(long)]
        markers: bool,
    },

    /// Report an incident
    Report {
        /// Incident type (power_cut, traffic_jam, safety_issue, other)
        #[arg(short, long)]
        kind: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: String,
        #[arg(long, allow_hyphen_values = true)]
        lng: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Read or update your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Join a city's chat room (type /quit to leave)
    Chat {
        /// City id
        city_id: String,
        /// Display name when chatting as a guest
        #[arg(long)]
        name: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the saved location and mobile number
    Show,
    /// Save a home location
    Location {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Save a mobile number
    Mobile { number: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(url) = cli.ws_url {
        config.chat.ws_url = url;
    }

    init_logging(&config);

    let session = config
        .session
        .to_session()
        .with_guest(ChatUser::new(format!("guest-{}", uuid::Uuid::new_v4()), GUEST_NAME));
    let api = ApiClient::new(config.api.client_config(), session.clone())?;

    match cli.command {
        Commands::Cities {
            search,
            category,
            sort,
        } => {
            let (cities, banner) = recover(api.list_cities().await, "cities");
            print_banner(banner);

            let query = FilterQuery::new(search, category.as_str());
            let shown = listing::apply(&cities, &query, sort);

            println!("{:<8} {:<24} {:<12} {:>7} {:>8}", "RANK", "CITY", "CATEGORY", "RATING", "REVIEWS");
            println!("{}", "-".repeat(63));
            for city in &shown {
                println!(
                    "{:<8} {:<24} {:<12} {:>7} {:>8}",
                    city.rank_label(),
                    city.name,
                    city.category,
                    city.rating_label(),
                    city.total_ratings
                );
            }
            if shown.is_empty() {
                println!("No cities match.");
            }
            println!("\nCategories: {}", listing::categories(&cities).join(", "));
        }

        Commands::City { slug } => {
            let detail = api.get_city(&slug).await?;
            let city = &detail.city;

            println!("{} ({})", city.name, detail.rank_label());
            if !city.description.is_empty() {
                println!("{}", city.description);
            }
            println!();
            println!("  Rating:      {} from {} ratings", city.rating_label(), city.total_ratings);
            println!("  Population:  {}", detail.population);
            println!("  Temperature: {:.1} C", detail.temperature);
            println!("  Internet:    {:.1} Mbps", detail.internet_speed);
            if !detail.amenities.is_empty() {
                println!("  Amenities:   {}", detail.amenities.join(", "));
            }
            println!();
            for line in detail.score_lines() {
                println!("  {} {:<20} {}", line.category.emoji(), line.category.label(), line.value);
            }
        }

        Commands::Rate {
            city_id,
            score,
            review,
        } => {
            let mut draft = RatingDraft::new();
            for entry in &score {
                let (category, value) = entry
                    .split_once('=')
                    .with_context(|| format!("Expected category=value, got '{}'", entry))?;
                let category = RatingCategory::from_id(category.trim())?;
                let value: i64 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("Score for {} is not a number", category))?;
                draft.set_value(category, value)?;
            }
            if let Some(review) = review {
                draft.set_review(review);
            }

            let submission = draft.prepare(Some(&city_id), session.user_id())?;
            api.submit_rating(&submission).await?;

            println!("Rating submitted for city {}", submission.city_id);
            for category in RatingCategory::ALL {
                let score = draft.effective(category);
                println!("  {:<20} {} ({})", category.label(), score.value(), score.label());
            }
        }

        Commands::Incidents { search, markers } => {
            let (incidents, banner) = recover(api.list_incidents().await, "incidents");
            print_banner(banner);
            let shown = listing::filter(&incidents, &FilterQuery::search(search));

            if markers {
                let widgets: Vec<_> = map::markers(&shown)
                    .iter()
                    .map(|marker| marker.to_widget())
                    .collect();
                println!("{}", serde_json::to_string_pretty(&widgets)?);
                return Ok(());
            }

            println!("{:<14} {:>12} {:>12}  {}", "TYPE", "LAT", "LNG", "DESCRIPTION");
            println!("{}", "-".repeat(70));
            for incident in &shown {
                println!(
                    "{:<14} {:>12.6} {:>12.6}  {}",
                    incident.incident_type.label(),
                    incident.latitude,
                    incident.longitude,
                    incident.description.as_deref().unwrap_or("-")
                );
            }
            println!();
            for (kind, count) in map::counts_by_kind(&shown) {
                println!("  {:<14} {}", kind.label(), count);
            }
        }

        Commands::Report {
            kind,
            lat,
            lng,
            description,
        } => {
            let Some(kind) = IncidentKind::from_id(&kind) else {
                bail!("Unknown incident type '{}'", kind);
            };
            let draft = IncidentDraft {
                kind: Some(kind),
                description,
                latitude: lat,
                longitude: lng,
            };
            let incident = draft.validate(session.user_id())?;
            api.create_incident(&incident).await?;

            println!(
                "Reported {} at {:.6}, {:.6}",
                incident.kind.label(),
                incident.latitude,
                incident.longitude
            );
        }

        Commands::Profile { action } => run_profile(&api, &session, action).await?,

        Commands::Chat { city_id, name } => {
            let mut user = session.chat_user();
            match name {
                Some(name) if !session.is_authenticated() => user.name = name,
                _ => {}
            }
            run_chat(&config, api, RoomId::new(city_id)?, user).await?;
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("wayfarer={}", config.logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_banner(banner: Option<String>) {
    if let Some(message) = banner {
        eprintln!("! {}", message);
    }
}

async fn run_profile(api: &ApiClient, session: &Session, action: ProfileAction) -> Result<()> {
    let user_id = profile_owner(session)?;

    match action {
        ProfileAction::Show => {
            let profile = api.get_profile(&user_id).await?;
            match profile.location() {
                Some(location) => println!(
                    "Location: {} ({:.4}, {:.4})",
                    location.display_name(),
                    location.position.lat,
                    location.position.lng
                ),
                None => println!("Location: not set"),
            }
            println!("Mobile:   {}", profile.mobile_number().unwrap_or("not set"));
        }
        ProfileAction::Location { name, lat, lng } => {
            let selected = SelectedLocation {
                name,
                position: Coordinate::new(lat, lng)?,
            };
            api.update_profile(&user_id, &ProfileUpdate::location(Some(&selected))?)
                .await?;
            println!("Location saved: {}", selected.display_name());
        }
        ProfileAction::Mobile { number } => {
            api.update_profile(&user_id, &ProfileUpdate::mobile(&number)?)
                .await?;
            println!("Mobile number saved");
        }
    }

    Ok(())
}

async fn run_chat(config: &Config, api: ApiClient, room: RoomId, user: ChatUser) -> Result<()> {
    let manager = ChatConnectionManager::new(
        WsConnector::new(&config.chat.ws_url),
        ReconnectPolicy::fixed(config.chat.reconnect_delay()),
    );
    println!("Joining room {} as {} ...", room, user.name);
    manager.open_with_history(room, user, api)?;

    let mut state = manager.watch_state();
    let mut messages = manager.subscribe_messages();
    let mut printed = HashSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                println!("[{}]", current.label());
            }
            changed = messages.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = messages.borrow_and_update().clone();
                print_new(&snapshot, &mut printed);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim() == "/quit" {
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = manager.send(&line) {
                    eprintln!("! {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    manager.close();
    println!("Left the room");
    Ok(())
}

fn print_new(messages: &[ChatMessage], printed: &mut HashSet<String>) {
    for message in messages {
        if printed.insert(message.id.clone()) {
            let marker = if message.is_own { "*" } else { " " };
            println!(
                "{} {} {}: {}",
                message.clock_time(),
                marker,
                message.display_author(),
                message.body
            );
        }
    }
}
