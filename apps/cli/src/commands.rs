//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use formfill_core::pipeline::{FillConfig, FillReport, ProgressReporter};
use formfill_core::{MappingGenerator, OpenRouterMapper, StaticMapper};
use formfill_forms::{FillStatus, FormSource};
use formfill_knowledge::{KnowledgeBase, RenderStyle};
use formfill_shared::{AppConfig, init_config, load_config, load_config_from, resolve_api_key};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// FormFill: answer job application forms from your own knowledge base.
#[derive(Parser)]
#[command(
    name = "formfill",
    version,
    about = "Map job application form fields onto a personal knowledge base and plan the fill.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.formfill/formfill.toml).
    #[arg(long, global = true, env = "FORMFILL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Resolve one path against the knowledge base and print the answer.
    Query {
        /// Path expression, e.g. `work_experience[0].job_title`.
        path: String,

        /// Knowledge base JSON file (defaults to the configured one).
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Indent mappings and sequences.
        #[arg(long)]
        pretty: bool,
    },

    /// Print the whole knowledge base (the schema shown to the model).
    Schema {
        /// Knowledge base JSON file.
        #[arg(long)]
        kb: Option<PathBuf>,
    },

    /// Check the knowledge base's well-known sections.
    Validate {
        /// Knowledge base JSON file.
        #[arg(long)]
        kb: Option<PathBuf>,
    },

    /// Scrape a form and print its fields.
    Scrape {
        /// Form URL, file:// URL, or local HTML path.
        form: String,
    },

    /// Run the full pipeline: scrape, map, resolve, and plan the fill.
    Run {
        /// Form URL, file:// URL, or local HTML path.
        form: String,

        /// Knowledge base JSON file.
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Model id (defaults to the configured one).
        #[arg(short, long)]
        model: Option<String>,

        /// Use a JSON file of label → path instead of the model.
        #[arg(long)]
        map: Option<PathBuf>,

        /// Directory for the run report (defaults to the configured one).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so command
/// output on stdout stays pipeable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "formfill=info",
        1 => "formfill=debug",
        _ => "formfill=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    match cli.command {
        Command::Query { path, kb, pretty } => {
            let config = app_config(config_path.as_deref())?;
            cmd_query(&config, kb.as_deref(), &path, pretty)
        }
        Command::Schema { kb } => {
            let config = app_config(config_path.as_deref())?;
            cmd_schema(&config, kb.as_deref())
        }
        Command::Validate { kb } => {
            let config = app_config(config_path.as_deref())?;
            cmd_validate(&config, kb.as_deref())
        }
        Command::Scrape { form } => cmd_scrape(&form).await,
        Command::Run {
            form,
            kb,
            model,
            map,
            out,
        } => {
            let config = app_config(config_path.as_deref())?;
            cmd_run(
                &config,
                &form,
                kb.as_deref(),
                model.as_deref(),
                map.as_deref(),
                out.as_deref(),
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

/// Load the config from `--config` if given, else from the default location.
fn app_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

fn knowledge_base_path(config: &AppConfig, flag: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.defaults.knowledge_base))
}

// ---------------------------------------------------------------------------
// Knowledge base commands
// ---------------------------------------------------------------------------

fn cmd_query(config: &AppConfig, kb: Option<&Path>, path: &str, pretty: bool) -> Result<()> {
    let kb = KnowledgeBase::load(knowledge_base_path(config, kb));
    let style = if pretty {
        RenderStyle::Pretty
    } else {
        RenderStyle::Compact
    };
    println!("{}", kb.answer_with(path, style));
    Ok(())
}

fn cmd_schema(config: &AppConfig, kb: Option<&Path>) -> Result<()> {
    let kb = KnowledgeBase::load(knowledge_base_path(config, kb));
    println!("{}", serde_json::to_string_pretty(kb.schema())?);
    Ok(())
}

fn cmd_validate(config: &AppConfig, kb: Option<&Path>) -> Result<()> {
    let path = knowledge_base_path(config, kb);
    let kb = KnowledgeBase::load(&path);
    let issues = kb.validate();

    if issues.is_empty() {
        println!("{}: OK ({} sections)", path.display(), kb.document().len());
    } else {
        println!("{}: {} issue(s)", path.display(), issues.len());
        for issue in &issues {
            println!("  - {}: {}", issue.section, issue.message);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Form commands
// ---------------------------------------------------------------------------

async fn cmd_scrape(form: &str) -> Result<()> {
    let source = FormSource::parse(form)?;
    let html = formfill_forms::load_form_html(&source).await?;
    let fields = formfill_forms::scrape_form_fields(&html);
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

async fn cmd_run(
    config: &AppConfig,
    form: &str,
    kb: Option<&Path>,
    model: Option<&str>,
    map: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    let fill_config = FillConfig {
        form: FormSource::parse(form)?,
        knowledge_base: knowledge_base_path(config, kb),
    };

    info!(form, kb = %fill_config.knowledge_base.display(), "starting fill run");

    let reporter = CliProgress::new()?;
    let report = match map {
        Some(map_path) => {
            let mapper = StaticMapper::from_json_file(map_path)?;
            run_with(&fill_config, &mapper, &reporter).await?
        }
        None => {
            let api_key = resolve_api_key(config)?;
            let mut mapper = OpenRouterMapper::new(&config.openrouter, api_key)?;
            if let Some(model) = model {
                mapper = mapper.with_model(model);
            }
            run_with(&fill_config, &mapper, &reporter).await?
        }
    };

    let report_dir = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.defaults.report_dir));
    let report_path = formfill_core::write_report(&report, &report_dir)?;

    print_summary(&report, &report_path);
    Ok(())
}

async fn run_with<M: MappingGenerator>(
    config: &FillConfig,
    mapper: &M,
    reporter: &CliProgress,
) -> Result<FillReport> {
    Ok(formfill_core::run_fill(config, mapper, reporter).await?)
}

fn print_summary(report: &FillReport, report_path: &Path) {
    println!();
    println!("  Fill plan ready");
    println!("  Run:      {}", report.run_id);
    println!("  Form:     {}", report.form_source);
    println!("  Mapper:   {}", report.mapper);
    println!("  Fields:   {}", report.fields.len());
    println!("  Answered: {}/{}", report.answered(), report.answers.len());
    println!("  Report:   {}", report_path.display());
    println!("  Time:     {:.1}s", report.elapsed_ms as f64 / 1000.0);
    println!();

    for action in &report.plan.actions {
        let marker = match action.status {
            FillStatus::Ready => "ok",
            FillStatus::NoData => "--",
            FillStatus::OptionNotFound => "??",
            FillStatus::UnknownField => "!!",
        };
        println!(
            "  [{marker}] {}: {}",
            action.label,
            action.value.as_deref().unwrap_or("")
        );
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn field_resolved(&self, label: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Resolving [{current}/{total}] {label}"));
    }

    fn done(&self, _report: &FillReport) {
        self.spinner.finish_and_clear();
    }
}

/// Clears the spinner when a run fails before `done`.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = app_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
