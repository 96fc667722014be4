use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{DataIndex, UserId};
use rand::Rng;
use recommender::{HybridConfig, RecommendError};
use server::{RecommendationService, SongPreference, SongRecommendation};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// SongRecs - hybrid collaborative-filtering song recommender
#[derive(Parser)]
#[command(name = "song-recs")]
#[command(about = "Song recommendations from listening history", long_about = None)]
struct Cli {
    /// Directory containing user.csv, songs.csv and listen_history.csv
    #[arg(short, long, env = "SONG_RECS_DATA", default_value = "data")]
    data_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend songs the user hasn't heard yet
    Recommend {
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        limit: usize,

        /// Show score breakdown and the most similar listeners
        #[arg(long)]
        explain: bool,
    },

    /// Show the user's most played songs
    Preferences {
        #[arg(long)]
        user_id: UserId,

        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Prompt for a user ID, then show preferences and recommendations
    Interactive,

    /// Search songs by title or artist
    Search {
        /// Case-insensitive substring
        #[arg(long)]
        title: String,
    },

    /// Fire concurrent recommendation requests at one shared model
    Benchmark {
        #[arg(long, default_value = "100")]
        requests: usize,

        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let start = Instant::now();
    let data_index = Arc::new(
        DataIndex::load_from_files(&cli.data_dir)
            .with_context(|| format!("Failed to load dataset from {}", cli.data_dir.display()))?,
    );
    tracing::debug!("Loaded dataset in {:?}", start.elapsed());

    if let Commands::Search { title } = &cli.command {
        return handle_search(&data_index, title, cli.format);
    }

    let service = RecommendationService::new(data_index, HybridConfig::default()).await?;

    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            explain,
        } => handle_recommend(&service, user_id, limit, explain, cli.format).await?,
        Commands::Preferences { user_id, limit } => {
            handle_preferences(&service, user_id, limit, cli.format)?
        }
        Commands::Interactive => handle_interactive(&service, cli.format).await?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(&service, requests, concurrent).await?,
        Commands::Search { .. } => {}
    }

    Ok(())
}

/// Returns the missing user id if `err` is a `UserNotFound` failure
fn missing_user(err: &anyhow::Error) -> Option<UserId> {
    match err.downcast_ref::<RecommendError>() {
        Some(RecommendError::UserNotFound { user_id }) => Some(*user_id),
        _ => None,
    }
}

fn print_user_not_found(user_id: UserId) {
    println!("{}", format!("User {} not found in the data.", user_id).yellow());
}

/// Handle the 'recommend' command
async fn handle_recommend(
    service: &RecommendationService,
    user_id: UserId,
    limit: usize,
    explain: bool,
    format: OutputFormat,
) -> Result<()> {
    let recommendations = match service.get_recommendations(user_id, limit).await {
        Ok(recs) => recs,
        Err(err) => match missing_user(&err) {
            Some(user_id) => {
                print_user_not_found(user_id);
                return Ok(());
            }
            None => return Err(err),
        },
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
        return Ok(());
    }

    print_recommendations(&recommendations, explain);

    if explain {
        println!("{}", "Most similar listeners:".bold());
        for neighbor in service.neighbors(user_id, 3)? {
            println!(
                "  user {} (similarity {:.3})",
                neighbor.user_id, neighbor.similarity
            );
        }
    }
    Ok(())
}

/// Handle the 'preferences' command
fn handle_preferences(
    service: &RecommendationService,
    user_id: UserId,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let preferences = match service.get_preferences(user_id, limit) {
        Ok(prefs) => prefs,
        Err(err) => match missing_user(&err) {
            Some(user_id) => {
                print_user_not_found(user_id);
                return Ok(());
            }
            None => return Err(err),
        },
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&preferences)?);
    } else {
        print_preferences(user_id, &preferences);
    }
    Ok(())
}

/// Handle the 'interactive' command
async fn handle_interactive(service: &RecommendationService, format: OutputFormat) -> Result<()> {
    print!("Please enter your user ID: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    let input = line.trim();
    if read == 0 || input.is_empty() {
        println!("User ID input was cancelled.");
        return Ok(());
    }

    let user_id: UserId = match input.parse() {
        Ok(id) => id,
        Err(_) => {
            println!("{}", format!("'{}' is not a valid user ID.", input).yellow());
            return Ok(());
        }
    };

    let limit = service.config().num_recommendations;
    handle_preferences(service, user_id, limit, format)?;
    if service.matrix().contains_user(user_id) {
        println!();
        handle_recommend(service, user_id, limit, false, format).await?;
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(data_index: &DataIndex, title: &str, format: OutputFormat) -> Result<()> {
    let matches: Vec<_> = data_index.search_songs(title).into_iter().take(20).collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("No songs found.");
    }
    for song in matches {
        println!("{:>6}  {} - {}", song.id, song.title, song.artist);
    }
    Ok(())
}

/// Draw `n` user ids uniformly (with replacement) from `known_users`
fn sample_users<R: Rng>(known_users: &[UserId], n: usize, rng: &mut R) -> Vec<UserId> {
    if known_users.is_empty() {
        return Vec::new();
    }
    (0..n)
        .map(|_| known_users[rng.random_range(0..known_users.len())])
        .collect()
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: &RecommendationService,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let known_users = service.matrix().user_ids().to_vec();
    anyhow::ensure!(!known_users.is_empty(), "Dataset has no listeners to benchmark");

    let user_ids = sample_users(&known_users, requests, &mut rand::rng());

    let limiter = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();

    let mut handles = vec![];
    for user in user_ids {
        let service = service.clone();
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            let _permit = limiter.acquire_owned().await?;
            let start = Instant::now();
            service.get_recommendations(user, 5).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    if timings.is_empty() {
        println!("No requests made.");
        return Ok(());
    }

    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let throughput = timings.len() as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn print_recommendations(recommendations: &[SongRecommendation], explain: bool) {
    println!("{}", "Recommended Songs".bold().blue());
    if recommendations.is_empty() {
        println!("No recommendations found.");
        return;
    }

    println!(
        "{}",
        format!("{:<4} {:>7}  {:<32} {:<24} {:>8}", "#", "Song ID", "Song Name", "Artist", "Score")
            .bold()
    );
    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "{:<4} {:>7}  {:<32} {:<24} {:>8.2}",
            (rank + 1).to_string().green(),
            rec.song_id,
            rec.title,
            rec.artist,
            rec.score
        );
        if explain {
            println!("     {}", rec.explanation.dimmed());
        }
    }
}

fn print_preferences(user_id: UserId, preferences: &[SongPreference]) {
    println!("{}", format!("User {} Preferences", user_id).bold().blue());
    if preferences.is_empty() {
        println!("No preferences found.");
        return;
    }

    println!(
        "{}",
        format!("{:>7}  {:<32} {:<24} {:>6}", "Song ID", "Song Name", "Artist", "Plays").bold()
    );
    for pref in preferences {
        println!(
            "{:>7}  {:<32} {:<24} {:>6}",
            pref.song_id, pref.title, pref.artist, pref.listen_count
        );
    }
}
