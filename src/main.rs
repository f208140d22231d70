//! currigen CLI entry point

use clap::{Parser, Subcommand};
use currigen::{
    commands::{
        cmd_exam, cmd_exam_delete, cmd_exam_update, cmd_ingest, cmd_init, cmd_notes, cmd_plan,
        cmd_retrieve, cmd_scheme, cmd_status, print_ingest_stats, print_retrieval_result,
        print_status, ExamOptions, IngestOptions, InitOptions, NotesOptions, PlanOptions,
        RetrieveOptions, SchemeOptions,
    },
    config::Config,
    db::ContentDb,
    embed::create_embedder,
    error::Result,
    generate::{ContentGenerator, HttpCompletionBackend},
    index::QdrantIndex,
    progress::LogWriterFactory,
    retrieval::RetrievalEngine,
    subject::SubjectMapper,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "currigen")]
#[command(version, about = "Curriculum retrieval and content generation", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize currigen configuration and database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Ingest a curriculum document into the vector index
    Ingest {
        /// Document file (markdown, text, or PDF with the 'pdf' feature)
        file: PathBuf,

        /// Subject of the document
        #[arg(short, long)]
        subject: String,

        /// Grade level or range (e.g. "primary 4" or "primary 4-6")
        #[arg(short, long)]
        grade_level: String,

        /// Document type
        #[arg(long, default_value = "curriculum")]
        document_type: String,

        /// Topic tags covered by the document
        #[arg(short, long)]
        topic: Vec<String>,

        /// Country the document belongs to
        #[arg(long)]
        country: Option<String>,
    },

    /// Retrieve curriculum context for a query
    Retrieve {
        /// Subject (aliases accepted, e.g. "math")
        #[arg(short, long)]
        subject: String,

        /// Grade level (e.g. "primary 4" or "primary four")
        #[arg(short, long)]
        grade_level: String,

        /// Topic to search for
        #[arg(short, long)]
        topic: String,

        /// Country filter
        #[arg(long)]
        country: Option<String>,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Generate a scheme of work
    Scheme {
        #[arg(short, long)]
        subject: String,

        #[arg(short, long)]
        grade_level: String,

        #[arg(short, long)]
        topic: String,

        #[arg(long)]
        country: Option<String>,
    },

    /// Generate a lesson plan for one week of a scheme
    Plan {
        /// Scheme of work id
        #[arg(long)]
        scheme_id: String,

        /// Week number
        #[arg(short, long)]
        week: u32,

        /// Teaching constraints to respect
        #[arg(long, default_value = "")]
        limitations: String,
    },

    /// Generate lesson notes for a lesson plan
    Notes {
        /// Scheme of work id
        #[arg(long)]
        scheme_id: String,

        /// Lesson plan id (the notes cover the plan's week)
        #[arg(long)]
        lesson_plan_id: String,

        /// Teaching method to emphasise
        #[arg(long, default_value = "")]
        teaching_method: String,
    },

    /// Generate or maintain exams
    Exam {
        #[command(subcommand)]
        action: ExamAction,
    },

    /// Show system status
    Status,
}

#[derive(Subcommand)]
enum ExamAction {
    /// Generate an exam over selected weeks of a scheme
    Generate {
        /// Scheme of work id
        #[arg(long)]
        scheme_id: String,

        /// Weeks to cover (repeatable)
        #[arg(short, long, required = true)]
        week: Vec<u32>,

        /// Exam type
        #[arg(long, default_value = "quiz")]
        exam_type: String,

        /// Exam duration
        #[arg(long, default_value = "1 hour")]
        duration: String,

        /// Total marks
        #[arg(long, default_value = "50")]
        total_marks: u32,

        /// Question types
        #[arg(long, default_value = "Multiple Choice, Short Answer, Essay")]
        question_types: String,

        /// Number of questions
        #[arg(long, default_value = "25")]
        num_questions: u32,

        /// Assessment focus
        #[arg(
            long,
            default_value = "Assess learning objectives covered in selected weeks"
        )]
        assessment_focus: String,
    },

    /// Replace an exam's content from a file
    Update {
        /// Exam id
        exam_id: String,

        /// File holding the replacement content
        #[arg(long)]
        content_file: PathBuf,
    },

    /// Delete an exam
    Delete {
        /// Exam id
        exam_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("currigen=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("currigen=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory).with_target(false))
        .with(filter)
        .init();

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let base_dir = cli
        .config
        .as_ref()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()));

    match cli.command {
        Commands::Init { force } => {
            let base_dir = base_dir.unwrap_or_else(Config::default_base_dir);
            cmd_init(InitOptions { base_dir, force }).await
        }

        Commands::Ingest {
            file,
            subject,
            grade_level,
            document_type,
            topic,
            country,
        } => {
            let config = load_config(&cli.config)?;
            let index = QdrantIndex::connect(&config).await?;
            index.ensure_collection().await?;
            let embedder = create_embedder(&config.embedding)?;

            let stats = cmd_ingest(
                &config,
                &index,
                embedder.as_ref(),
                IngestOptions {
                    file,
                    subject,
                    grade_level,
                    document_type,
                    topics: topic,
                    country,
                },
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_ingest_stats(&stats);
            }
            Ok(())
        }

        Commands::Retrieve {
            subject,
            grade_level,
            topic,
            country,
            top_k,
        } => {
            let config = load_config(&cli.config)?;
            let engine = build_engine(&config).await?;

            let result = cmd_retrieve(
                &engine,
                RetrieveOptions {
                    subject,
                    grade_level,
                    topic,
                    country,
                    top_k,
                },
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_retrieval_result(&result);
            }
            Ok(())
        }

        Commands::Scheme {
            subject,
            grade_level,
            topic,
            country,
        } => {
            let config = load_config(&cli.config)?;
            let db = ContentDb::connect(&config.paths.db_file).await?;
            let engine = build_engine(&config).await?;
            let generator = build_generator(&config)?;
            let subjects = SubjectMapper::new(&config.subjects);

            let outcome = cmd_scheme(
                &db,
                &engine,
                &generator,
                &subjects,
                &config.country,
                SchemeOptions {
                    subject,
                    grade_level,
                    topic,
                    country,
                },
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("Scheme id:  {}", outcome.scheme_id);
                println!("Context id: {}", outcome.context_id);
                println!("\n{}", outcome.content);
            }
            Ok(())
        }

        Commands::Plan {
            scheme_id,
            week,
            limitations,
        } => {
            let config = load_config(&cli.config)?;
            let db = ContentDb::connect(&config.paths.db_file).await?;
            let generator = build_generator(&config)?;

            let outcome = cmd_plan(
                &db,
                &generator,
                PlanOptions {
                    scheme_id,
                    week,
                    limitations,
                },
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("Lesson plan id: {}", outcome.lesson_plan_id);
                println!("Week:           {}", outcome.week);
                println!("\n{}", outcome.content);
            }
            Ok(())
        }

        Commands::Notes {
            scheme_id,
            lesson_plan_id,
            teaching_method,
        } => {
            let config = load_config(&cli.config)?;
            let db = ContentDb::connect(&config.paths.db_file).await?;
            let generator = build_generator(&config)?;

            let outcome = cmd_notes(
                &db,
                &generator,
                NotesOptions {
                    scheme_id,
                    lesson_plan_id,
                    teaching_method,
                },
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("Lesson notes id: {}", outcome.lesson_notes_id);
                println!("Week:            {}", outcome.week);
                println!("\n{}", outcome.content);
            }
            Ok(())
        }

        Commands::Exam { action } => {
            let config = load_config(&cli.config)?;
            let db = ContentDb::connect(&config.paths.db_file).await?;

            match action {
                ExamAction::Generate {
                    scheme_id,
                    week,
                    exam_type,
                    duration,
                    total_marks,
                    question_types,
                    num_questions,
                    assessment_focus,
                } => {
                    let generator = build_generator(&config)?;
                    let outcome = cmd_exam(
                        &db,
                        &generator,
                        ExamOptions {
                            scheme_id,
                            weeks: week,
                            exam_type,
                            exam_duration: duration,
                            total_marks,
                            question_types,
                            num_questions,
                            assessment_focus,
                        },
                    )
                    .await?;

                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&outcome)?);
                    } else {
                        println!("Exam id:       {}", outcome.exam_id);
                        println!("Weeks covered: {:?}", outcome.weeks_covered);
                        println!(
                            "Materials:     {} plans, {} notes",
                            outcome.materials_used.lesson_plans,
                            outcome.materials_used.lesson_notes
                        );
                        println!("\n{}", outcome.content);
                    }
                    Ok(())
                }

                ExamAction::Update {
                    exam_id,
                    content_file,
                } => {
                    let content = std::fs::read_to_string(&content_file)?;
                    cmd_exam_update(&db, &exam_id, content).await?;
                    println!("Exam {} updated", exam_id);
                    Ok(())
                }

                ExamAction::Delete { exam_id } => {
                    cmd_exam_delete(&db, &exam_id).await?;
                    println!("Exam {} deleted", exam_id);
                    Ok(())
                }
            }
        }

        Commands::Status => {
            let config = load_config(&cli.config)?;
            let db = ContentDb::connect(&config.paths.db_file).await?;
            let index = QdrantIndex::connect(&config).await?;

            let status = cmd_status(&config, &db, &index).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
            Ok(())
        }
    }
}

fn load_config(config_path: &Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_from(None),
    }
}

/// Build the retrieval engine once: index, embedder and subject tables
/// are constructed here and owned by the engine for the process lifetime
async fn build_engine(config: &Config) -> Result<RetrievalEngine> {
    let index = QdrantIndex::connect(config).await?;
    let embedder = create_embedder(&config.embedding)?;
    let subjects = SubjectMapper::new(&config.subjects);

    Ok(RetrievalEngine::new(
        Box::new(index),
        embedder,
        subjects,
        config.country.clone(),
        &config.retrieval,
    ))
}

fn build_generator(config: &Config) -> Result<ContentGenerator> {
    let backend = HttpCompletionBackend::new(&config.generation)?;
    Ok(ContentGenerator::new(Box::new(backend)))
}
