use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{DataIndex, MovieId, UserId};
use evaluation::{EvaluationConfig, EvaluationReport};
use service::{
    ModelHandle, MovieRecommendation, RecommendationService, TrainingConfig, TrainingSummary,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// MovieRecs - collaborative, content-based and hybrid movie recommendations
#[derive(Parser)]
#[command(name = "movie-recs")]
#[command(about = "Movie recommendation engine for the MovieLens dataset", long_about = None)]
struct Cli {
    /// Path to MovieLens dataset directory
    #[arg(
        short,
        long,
        global = true,
        env = "MOVIE_RECS_DATA_DIR",
        default_value = "data/ml-latest-small"
    )]
    data_dir: PathBuf,

    /// Directory trained models are saved to and loaded from
    #[arg(
        short,
        long,
        global = true,
        env = "MOVIE_RECS_MODEL_DIR",
        default_value = "models"
    )]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the collaborative and hybrid models and save them
    Train {
        /// Grid-search the neighbor count and blend weight first
        #[arg(long)]
        tune: bool,

        /// Add TF-IDF features from tags and titles to the genre features
        #[arg(long)]
        use_tags: bool,

        /// Seed for the train/test split and evaluation sampling
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Train in memory and report precision, recall and hit rate
    Evaluate {
        /// Cutoff for precision@k and recall@k
        #[arg(long, default_value = "10")]
        k: usize,

        /// Test ratings at or above this count as liked
        #[arg(long, default_value = "3.5")]
        threshold: f32,

        /// Add TF-IDF features from tags and titles to the genre features
        #[arg(long)]
        use_tags: bool,

        /// Seed for the train/test split and evaluation sampling
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Get movie recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations per model
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Print the recommendations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find movies with similar content
    Similar {
        /// Movie ID to find similar movies for
        #[arg(long)]
        movie_id: MovieId,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Show user profile and rating history
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            tune,
            use_tags,
            seed,
        } => {
            let config = TrainingConfig::default()
                .with_data_dir(&cli.data_dir)
                .with_model_dir(&cli.model_dir)
                .with_tuning(tune)
                .with_tags(use_tags)
                .with_seed(seed)
                .with_evaluation(EvaluationConfig::default().with_seed(seed));
            handle_train(&config)?
        }
        Commands::Evaluate {
            k,
            threshold,
            use_tags,
            seed,
        } => {
            let config = evaluate_config(&cli.data_dir, k, threshold, use_tags, seed);
            handle_evaluate(&config)?
        }
        Commands::Recommend {
            user_id,
            limit,
            json,
        } => {
            let service = load_service(&cli.data_dir, Some(&cli.model_dir))?;
            handle_recommend(&service, user_id, limit, json)?
        }
        Commands::Similar { movie_id, limit } => {
            let service = load_service(&cli.data_dir, Some(&cli.model_dir))?;
            handle_similar(&service, movie_id, limit)?
        }
        Commands::Search { title } => {
            let service = load_service(&cli.data_dir, None)?;
            handle_search(&service, &title)
        }
        Commands::User { user_id } => {
            let service = load_service(&cli.data_dir, None)?;
            handle_user(&service, user_id)?
        }
    }

    Ok(())
}

/// Training setup for the 'evaluate' command, seeded like 'train'
fn evaluate_config(
    data_dir: &Path,
    k: usize,
    threshold: f32,
    use_tags: bool,
    seed: u64,
) -> TrainingConfig {
    TrainingConfig::default()
        .with_data_dir(data_dir)
        .with_tags(use_tags)
        .with_seed(seed)
        .with_evaluation(
            EvaluationConfig::default()
                .with_k(k)
                .with_threshold(threshold)
                .with_seed(seed),
        )
}

/// Load the catalog and, when `model_dir` is given, the trained models
fn load_service(data_dir: &Path, model_dir: Option<&Path>) -> Result<RecommendationService> {
    println!("Loading MovieLens dataset from {}...", data_dir.display());
    let start = Instant::now();
    let data_index = Arc::new(
        DataIndex::load_from_files(data_dir).context("Failed to load MovieLens dataset")?,
    );
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());

    let handle = ModelHandle::new();
    if let Some(model_dir) = model_dir {
        handle.load_from_dir(model_dir).with_context(|| {
            format!(
                "Failed to load models from {}. Run `movie-recs train` first",
                model_dir.display()
            )
        })?;
    }
    Ok(RecommendationService::new(handle, data_index))
}

/// Handle the 'train' command
fn handle_train(config: &TrainingConfig) -> Result<()> {
    let start = Instant::now();
    let (_, summary) = service::train(config)?;
    print_training_summary(&summary);
    println!(
        "{} Models saved to {} in {:?}",
        "✓".green(),
        config.model_dir.display(),
        start.elapsed()
    );
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(config: &TrainingConfig) -> Result<()> {
    let summary = service::evaluate(config)?;

    println!(
        "{}",
        format!("Evaluation (k = {}):", config.evaluation.k).bold().blue()
    );
    print_report("Collaborative Filtering", &summary.collaborative);
    print_report("Hybrid", &summary.hybrid);
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    service: &RecommendationService,
    user_id: UserId,
    limit: usize,
    json: bool,
) -> Result<()> {
    let recs = service.recommend_for_user(user_id, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recs)?);
        return Ok(());
    }

    if recs.is_empty() {
        println!("No recommendations available for user {}", user_id);
        return Ok(());
    }
    print_recommendations("Collaborative Filtering Recommendations:", &recs.collaborative);
    print_recommendations("Hybrid Recommendations:", &recs.hybrid);
    Ok(())
}

/// Handle the 'similar' command
fn handle_similar(service: &RecommendationService, movie_id: MovieId, limit: usize) -> Result<()> {
    let similar = service.similar_movies(movie_id, limit)?;
    if similar.is_empty() {
        println!("No similar movies available for movie {}", movie_id);
        return Ok(());
    }
    print_recommendations(&format!("Movies similar to {}:", movie_id), &similar);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(service: &RecommendationService, title: &str) {
    let results = service.search_titles(title);
    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if results.is_empty() {
        println!("  No matching movies");
    }
    for result in results {
        println!("{}: {}", result.movie_id.to_string().green(), result.title);
    }
}

/// Handle the 'user' command
fn handle_user(service: &RecommendationService, user_id: UserId) -> Result<()> {
    let profile = service
        .user_profile(user_id, 5)
        .ok_or_else(|| anyhow!("User {} not found", user_id))?;
    info!("Found {} ratings for user {}", profile.rating_count, user_id);

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    println!("{}Number of ratings: {}", "• ".cyan(), profile.rating_count);
    println!("{}Average rating: {:.2}", "• ".cyan(), profile.average_rating);
    println!("Top rated movies:");
    for movie in &profile.top_rated {
        println!("  - {} (Rating: {})", movie.title, movie.rating);
    }
    Ok(())
}

fn print_training_summary(summary: &TrainingSummary) {
    println!("{}", "Training Summary:".bold().blue());
    println!(
        "{}Ratings: {} train, {} test ({} users excluded)",
        "• ".green(),
        summary.train_ratings,
        summary.test_ratings,
        summary.excluded_users
    );
    if let Some(tuning) = &summary.neighbor_tuning {
        for trial in &tuning.trials {
            println!("  k = {:<3} hit rate {:.4}", trial.param, trial.report.hit_rate);
        }
    }
    if let Some(tuning) = &summary.weight_tuning {
        for trial in &tuning.trials {
            println!(
                "  blend weight = {:.1} hit rate {:.4}",
                trial.param, trial.report.hit_rate
            );
        }
    }
    println!("{}Neighbors (k): {}", "• ".green(), summary.neighbors);
    println!("{}Blend weight: {}", "• ".green(), summary.blend_weight);
}

fn print_report(label: &str, report: &EvaluationReport) {
    println!("{}", label.bold());
    println!("  Precision@{}: {:.4}", report.k, report.precision);
    println!("  Recall@{}: {:.4}", report.k, report.recall);
    println!("  Hit rate: {:.4}", report.hit_rate);
    println!(
        "  Users: {} evaluated, {} skipped, {} failed of {} sampled",
        report.evaluated_users, report.skipped_users, report.failed_users, report.sampled_users
    );
}

/// Helper function to format and print recommendations
fn print_recommendations(header: &str, recommendations: &[MovieRecommendation]) {
    println!("{}", header.bold().blue());
    if recommendations.is_empty() {
        println!("  None available");
        return;
    }
    for (rank, movie) in recommendations.iter().enumerate() {
        println!(
            "{}. {} [{}] - Score: {:.3}",
            (rank + 1).to_string().green(),
            movie.title,
            movie.genres.join(", "),
            movie.score
        );
    }
}
