//! Keiba CLI - Course-aptitude scoring for horse races

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use keiba::config::{AptitudeMode, DistanceAdjustment, ScoringConfig, DEFAULT_FIELD_SIZE};
use keiba::data::{load_entries, load_results, parse_race_list, CourseWeights, DEFAULT_WEIGHTS_PATH};
use keiba::evaluation::{analyze_by_course, evaluate_race, summarize, RaceEvaluation};
use keiba::models::{ScoredRace, Surface};
use keiba::pipeline::score_race;
use keiba::report::{
    render_evaluation, report_file_name, scored_file_name, write_report, write_scored_csv,
};

/// Default data directories (relative to project root)
const DEFAULT_ASSETS_DIR: &str = "assets";
const DEFAULT_REPORTS_DIR: &str = "reports";

#[derive(Parser)]
#[command(name = "keiba")]
#[command(author, version, about = "Horse race course-aptitude scoring CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run in interactive mode
    #[arg(short, long)]
    interactive: bool,

    /// Directory holding race cards and scored tables
    #[arg(long, global = true, default_value = DEFAULT_ASSETS_DIR)]
    assets_dir: PathBuf,

    /// Directory for text reports
    #[arg(long, global = true, default_value = DEFAULT_REPORTS_DIR)]
    reports_dir: PathBuf,

    /// Course weight JSON file
    #[arg(long, global = true, default_value = DEFAULT_WEIGHTS_PATH)]
    weights: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Clone)]
struct RaceArgs {
    /// Race ID (e.g. 202505050812); defaults to the input file stem
    #[arg(long, required_unless_present = "input")]
    race_id: Option<String>,

    /// Race card CSV (default: <assets>/race_<race_id>_raw.csv)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Target distance in meters
    #[arg(short, long)]
    distance: u32,

    /// Course name as used in the weight file (e.g. 東京)
    #[arg(short, long)]
    course: String,

    /// Target surface (芝/ダ or turf/dirt)
    #[arg(short, long, value_parser = parse_surface)]
    surface: Surface,

    /// Field size used for corner-position fractions
    #[arg(long, default_value_t = DEFAULT_FIELD_SIZE)]
    field_size: u32,

    /// Use the weighted sum directly instead of re-scaling it
    #[arg(long)]
    direct: bool,

    /// One per-furlong time correction (seconds) for both surfaces
    #[arg(long)]
    flat_adjustment: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single race
    Score {
        #[command(flatten)]
        race: RaceArgs,

        /// Scored CSV output path (default: <assets>/race_<id>_<dist>m_<course>_course.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write a text report to the reports directory
        #[arg(long)]
        report: bool,
    },

    /// Score every race in a race list file
    Batch {
        /// Race list: "race_id distance course surface [field_size]" per line
        #[arg(long)]
        race_list: PathBuf,

        /// Use the weighted sum directly instead of re-scaling it
        #[arg(long)]
        direct: bool,

        /// Directory of result tables (race_<id>_result.csv) for evaluation
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },

    /// Compare a race's model ranking with its actual result
    Evaluate {
        #[command(flatten)]
        race: RaceArgs,

        /// Result CSV (馬名,着順,人気,オッズ)
        #[arg(short, long)]
        results: PathBuf,

        /// Popularity gap above which a horse is flagged as undervalued
        #[arg(long, default_value = "5")]
        gap: i64,
    },
}

fn parse_surface(s: &str) -> std::result::Result<Surface, String> {
    Surface::from_arg(s).ok_or_else(|| format!("unknown surface '{}' (use 芝/ダ or turf/dirt)", s))
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    println!("{}", "Keiba Scoring CLI v0.3.0".cyan().bold());
    println!();

    if cli.interactive {
        run_interactive(&cli)?;
    } else if let Some(command) = &cli.command {
        match command {
            Commands::Score {
                race,
                output,
                report,
            } => {
                let weights = load_weights(&cli.weights)?;
                let scored = score_from_args(&cli.assets_dir, race, &weights)?;
                print_ranking(&scored);
                save_outputs(&cli, &scored, output.as_deref(), *report)?;
            }
            Commands::Batch {
                race_list,
                direct,
                results_dir,
            } => {
                run_batch(&cli, race_list, *direct, results_dir.as_deref())?;
            }
            Commands::Evaluate { race, results, gap } => {
                let weights = load_weights(&cli.weights)?;
                let scored = score_from_args(&cli.assets_dir, race, &weights)?;
                let rows = load_results(results)
                    .with_context(|| format!("Failed to load results from {:?}", results))?;
                let evaluation = evaluate_race(&scored, &rows, *gap);
                print_evaluation(&evaluation);
            }
        }
    } else {
        println!("Use --help for usage information or --interactive for interactive mode.");
    }

    Ok(())
}

fn load_weights(path: &Path) -> Result<CourseWeights> {
    CourseWeights::load(path).with_context(|| format!("Failed to load course weights from {:?}", path))
}

fn raw_input_path(assets_dir: &Path, race_id: &str) -> PathBuf {
    assets_dir.join(format!("race_{}_raw.csv", race_id))
}

fn score_from_args(assets_dir: &Path, args: &RaceArgs, weights: &CourseWeights) -> Result<ScoredRace> {
    let (race_id, input) = match (&args.race_id, &args.input) {
        (Some(id), Some(input)) => (id.clone(), input.clone()),
        (Some(id), None) => (id.clone(), raw_input_path(assets_dir, id)),
        (None, Some(input)) => (race_id_from_path(input), input.clone()),
        (None, None) => bail!("Either --race-id or --input is required"),
    };
    score_file(&input, &race_id, &args.course, weights, &config_from_args(args))
}

fn config_from_args(args: &RaceArgs) -> ScoringConfig {
    let mode = if args.direct {
        AptitudeMode::Direct
    } else {
        AptitudeMode::DoubleDeviation
    };
    let mut config = ScoringConfig::new(args.distance, args.surface)
        .with_field_size(args.field_size)
        .with_mode(mode);
    if let Some(per_furlong) = args.flat_adjustment {
        config = config.with_distance_adjustment(DistanceAdjustment::flat(per_furlong));
    }
    config
}

/// `race_<id>_raw.csv` → `<id>`, otherwise the bare file stem
fn race_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.strip_prefix("race_")
        .and_then(|s| s.strip_suffix("_raw"))
        .map(str::to_string)
        .unwrap_or(stem)
}

fn score_file(
    input: &Path,
    race_id: &str,
    course: &str,
    weights: &CourseWeights,
    config: &ScoringConfig,
) -> Result<ScoredRace> {
    println!(
        "{}: {} / {} {}{}m",
        "Scoring".green(),
        race_id,
        course,
        config.target_surface.tag(),
        config.target_distance
    );

    let horses =
        load_entries(input).with_context(|| format!("Failed to load race card from {:?}", input))?;
    if horses.is_empty() {
        bail!("No entries found in {:?}", input);
    }

    let scored = score_race(race_id, course, &horses, weights, config)
        .with_context(|| format!("Failed to score race {}", race_id))?;
    Ok(scored)
}

fn save_outputs(cli: &Cli, scored: &ScoredRace, output: Option<&Path>, report: bool) -> Result<()> {
    let csv_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cli.assets_dir.join(scored_file_name(scored)));
    write_scored_csv(scored, &csv_path)
        .with_context(|| format!("Failed to write scored table to {:?}", csv_path))?;
    println!("{} {:?}", "Saved:".green(), csv_path);

    if report {
        let report_path = cli.reports_dir.join(report_file_name(scored));
        write_report(scored, &report_path)
            .with_context(|| format!("Failed to write report to {:?}", report_path))?;
        println!("{} {:?}", "Report:".green(), report_path);
    }
    Ok(())
}

/// Truncate name to fit display width
fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        name.chars().take(max_chars).collect()
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_ranking(race: &ScoredRace) {
    let ctx = &race.context;
    println!();
    println!(
        "{}",
        format!(
            "{}適性スコア ({}{}m) - Ranking:",
            ctx.course,
            ctx.surface.tag(),
            ctx.distance
        )
        .yellow()
        .bold()
    );
    println!(
        "{:>4} {:>4} {:<18} {:>8} {:>8} {:>8} {:>6} {:>6} {:>6} {:>8}",
        "順位", "馬番", "馬名", "speed", "closing", "lead", "S偏差", "C偏差", "L偏差", "score"
    );
    println!("{}", "-".repeat(90));

    for (entry, horse) in race.ranked_horses() {
        let line = format!(
            "{:>4} {:>4} {:<18} {:>8} {:>8} {:>8} {:>6.2} {:>6.2} {:>6.2} {:>8.2}",
            entry.rank,
            horse.horse_no.map(|n| n.to_string()).unwrap_or_default(),
            truncate_name(&horse.name, 18),
            fmt_opt(horse.raw.speed, 2),
            fmt_opt(horse.raw.closing, 2),
            fmt_opt(horse.raw.lead, 3),
            horse.deviation.speed,
            horse.deviation.closing,
            horse.deviation.lead,
            entry.score
        );
        if entry.rank == 1 {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }

    let unscored: Vec<&str> = race.unscored_horses().map(|h| h.name.as_str()).collect();
    if !unscored.is_empty() {
        println!();
        println!("{} {}", "Unscored:".dimmed(), unscored.join(", ").dimmed());
    }
    println!();
}

fn print_evaluation(evaluation: &RaceEvaluation) {
    println!();
    println!("{}", "モデル順位 vs 実着順 (Model vs Result):".yellow().bold());
    print!("{}", render_evaluation(evaluation));

    if !evaluation.unmatched.is_empty() {
        println!(
            "{} {}",
            "No result for:".dimmed(),
            evaluation.unmatched.join(", ").dimmed()
        );
    }
    println!();
}

fn run_batch(cli: &Cli, race_list: &Path, direct: bool, results_dir: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(race_list)
        .with_context(|| format!("Failed to read race list {:?}", race_list))?;
    let races = parse_race_list(&text);
    if races.is_empty() {
        println!("{}", "No races found in race list.".yellow());
        return Ok(());
    }

    let weights = load_weights(&cli.weights)?;
    let mode = if direct {
        AptitudeMode::Direct
    } else {
        AptitudeMode::DoubleDeviation
    };

    println!("{} {} races", "Batch:".green(), races.len());

    let pb = ProgressBar::new(races.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}")?);

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut evaluations = Vec::new();

    for entry in &races {
        pb.set_message(format!("{} {}", entry.race_id, entry.course));

        let config = ScoringConfig::new(entry.distance, entry.surface)
            .with_field_size(entry.field_size)
            .with_mode(mode);
        let input = raw_input_path(&cli.assets_dir, &entry.race_id);

        let outcome = pb.suspend(|| score_file(&input, &entry.race_id, &entry.course, &weights, &config));
        match outcome.and_then(|scored| {
            save_outputs(cli, &scored, None, true)?;
            Ok(scored)
        }) {
            Ok(scored) => {
                succeeded += 1;
                if let Some(dir) = results_dir {
                    let path = dir.join(format!("race_{}_result.csv", entry.race_id));
                    if path.exists() {
                        match load_results(&path) {
                            Ok(rows) => evaluations.push(evaluate_race(
                                &scored,
                                &rows,
                                keiba::evaluation::DEFAULT_GAP_THRESHOLD,
                            )),
                            Err(e) => error!("Failed to load results {:?}: {}", path, e),
                        }
                    } else {
                        info!("No result table for race {}", entry.race_id);
                    }
                }
            }
            Err(e) => {
                failed += 1;
                error!("Race {} failed: {:#}", entry.race_id, e);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!();
    println!(
        "{} {} scored, {} failed",
        "Batch complete:".green().bold(),
        succeeded,
        failed
    );

    if !evaluations.is_empty() {
        print_summary(&evaluations);
    }

    Ok(())
}

fn print_summary(evaluations: &[RaceEvaluation]) {
    let summary = summarize(evaluations);

    println!();
    println!("{}", "Evaluation Summary:".yellow().bold());
    println!("Races evaluated: {}", summary.races);
    println!(
        "Top pick wins: {} ({:.1}%)",
        summary.top_pick_wins,
        summary.top_pick_win_rate * 100.0
    );
    println!(
        "Top pick in the money: {} ({:.1}%)",
        summary.top_pick_in_the_money,
        summary.top_pick_in_the_money_rate * 100.0
    );
    if let Some(rho) = summary.mean_rank_correlation {
        println!("Mean rank correlation: {:.3}", rho);
    }

    println!();
    println!("{}", "Analysis by Course:".yellow().bold());
    println!(
        "{:<10} {:>6} {:>6} {:>8} {:>6} {:>8}",
        "Course", "Races", "Wins", "Win%", "Top3", "Top3%"
    );
    println!("{}", "-".repeat(50));
    for row in analyze_by_course(evaluations) {
        println!(
            "{:<10} {:>6} {:>6} {:>7.1}% {:>6} {:>7.1}%",
            row.key,
            row.races,
            row.wins,
            row.win_rate * 100.0,
            row.in_the_money,
            row.in_the_money_rate * 100.0
        );
    }
}

fn run_interactive(cli: &Cli) -> Result<()> {
    let theme = ColorfulTheme::default();
    let weights = load_weights(&cli.weights)?;

    let courses: Vec<&str> = weights.courses().collect();
    if courses.is_empty() {
        bail!("No courses configured in {:?}", cli.weights);
    }

    let race_id: String = Input::with_theme(&theme)
        .with_prompt("Race ID")
        .interact_text()?;

    let default_input = raw_input_path(&cli.assets_dir, &race_id);
    let input: String = Input::with_theme(&theme)
        .with_prompt("Race card CSV")
        .default(default_input.display().to_string())
        .interact_text()?;

    let course_idx = Select::with_theme(&theme)
        .with_prompt("Course")
        .items(&courses)
        .default(0)
        .interact()?;
    let course = courses[course_idx];

    let keys = weights.keys_for(course);
    println!("{} {}", "Configured:".dimmed(), keys.join(", ").dimmed());

    let surfaces = [Surface::Turf, Surface::Dirt];
    let surface_labels = ["芝 (turf)", "ダ (dirt)"];
    let surface_idx = Select::with_theme(&theme)
        .with_prompt("Surface")
        .items(&surface_labels)
        .default(0)
        .interact()?;

    let distance: u32 = Input::with_theme(&theme)
        .with_prompt("Distance (m)")
        .default(1600)
        .interact_text()?;

    let field_size: u32 = Input::with_theme(&theme)
        .with_prompt("Field size")
        .default(DEFAULT_FIELD_SIZE)
        .interact_text()?;

    let config = ScoringConfig::new(distance, surfaces[surface_idx]).with_field_size(field_size);
    let scored = score_file(Path::new(&input), &race_id, course, &weights, &config)?;
    print_ranking(&scored);
    save_outputs(cli, &scored, None, true)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_id_from_path() {
        assert_eq!(race_id_from_path(Path::new("assets/race_202505050812_raw.csv")), "202505050812");
        assert_eq!(race_id_from_path(Path::new("card.csv")), "card");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("ドウデュース", 3), "ドウデ");
        assert_eq!(truncate_name("Alpha", 10), "Alpha");
    }

    #[test]
    fn test_config_from_args() {
        let cli = Cli::parse_from([
            "keiba", "score", "--race-id", "r1", "-d", "1800", "-c", "中山", "-s", "ダ",
            "--direct", "--flat-adjustment", "0.4",
        ]);
        let Some(Commands::Score { race, .. }) = cli.command else {
            panic!("expected score command");
        };

        let config = config_from_args(&race);
        assert_eq!(config.target_distance, 1800);
        assert_eq!(config.target_surface, Surface::Dirt);
        assert_eq!(config.field_size, DEFAULT_FIELD_SIZE);
        assert_eq!(config.aptitude_mode, AptitudeMode::Direct);
        assert_eq!(config.distance_adjustment.per_furlong(Surface::Dirt), 0.4);

        let default = config_from_args(&RaceArgs {
            flat_adjustment: None,
            direct: false,
            ..race
        });
        assert_eq!(default.distance_adjustment, DistanceAdjustment::default());
        assert_eq!(default.aptitude_mode, AptitudeMode::DoubleDeviation);
    }

    #[test]
    fn test_parse_surface_arg() {
        assert_eq!(parse_surface("芝"), Ok(Surface::Turf));
        assert_eq!(parse_surface("dirt"), Ok(Surface::Dirt));
        assert!(parse_surface("障害").is_err());
    }
}
