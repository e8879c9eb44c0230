//! reportgrid CLI - run, render and export reports
//!
//! Usage:
//!   reportgrid render <rows.json> [--output html] [--headers union]
//!   reportgrid run --report <name>
//!   reportgrid run --query "SELECT ..." [--group-by <field>] [--filter "<field> <op> <value>"]
//!   reportgrid export --report <name> --format csv
//!
//! Examples:
//!   reportgrid render result.json
//!   reportgrid run --query "SELECT region, amount FROM sales" --group-by region --subtotal amount:SUM
//!   reportgrid report list
//!   reportgrid columns customers orders

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use reportgrid::config::Settings;
use reportgrid::designer::export_report_name;
use reportgrid::render::{to_html, to_text, Grid, HeaderStrategy, Renderer};
use reportgrid::report::{
    decode_rows, validate_sql_query, ExportFormat, Filter, QueryConfig, QueryType,
    ReportDefinition, ReportStatistics, ResultRow, SubtotalField,
};
use reportgrid::rpc::ReportClient;
use reportgrid::session::{ReportSession, SessionError};
use std::fmt::Display;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reportgrid")]
#[command(about = "reportgrid - run, render and export reports from a report server")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the standard lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a saved result set (JSON array of rows, `-` for stdin)
    Render {
        file: PathBuf,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Print statistics of a saved result set
    Stats { file: PathBuf },

    /// Execute a saved report or an ad-hoc query and render the result
    Run {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        view: ViewArgs,

        /// Also print result statistics
        #[arg(long)]
        stats: bool,
    },

    /// Preview a query (row-limited by the server)
    Preview {
        query: String,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// List tables available to report queries
    Tables,

    /// Describe the columns of one or more tables
    Columns {
        #[arg(required = true)]
        tables: Vec<String>,
    },

    /// Execute and export through the server's exporter
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Export format (pdf, excel, csv); defaults to the configured one
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Name of the exported report
        #[arg(short, long)]
        name: Option<String>,

        /// Write inline CSV content to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Manage saved report definitions
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },

    /// Start the web server
    #[cfg(feature = "ui")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[derive(Subcommand)]
enum ReportAction {
    /// Print a saved definition as JSON
    Get { name: String },
    /// List saved reports
    List,
    /// Save a new definition from a JSON file
    Create { file: PathBuf },
    /// Change fields of a saved definition from a JSON file
    Update { name: String, file: PathBuf },
    /// Delete a saved definition
    Delete { name: String },
    /// Check a definition file without contacting the server
    Validate { file: PathBuf },
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Saved report to execute
    #[arg(short, long, conflicts_with = "query")]
    report: Option<String>,

    /// Ad-hoc query text
    #[arg(short, long, required_unless_present = "report")]
    query: Option<String>,

    #[arg(long = "type", default_value = "SQL")]
    query_type: QueryType,

    /// Grouping field (repeatable)
    #[arg(long)]
    group_by: Vec<String>,

    /// Filter as "<field> <operator> <value>" (repeatable)
    #[arg(long)]
    filter: Vec<Filter>,

    /// Subtotal as "<field>[:<SUM|AVG|COUNT|MAX|MIN>]" (repeatable)
    #[arg(long)]
    subtotal: Vec<SubtotalField>,
}

impl SourceArgs {
    fn query_config(&self) -> Option<QueryConfig> {
        let query = self.query.as_ref()?;
        Some(QueryConfig {
            query: query.clone(),
            query_type: self.query_type,
            grouping_fields: self.group_by.clone(),
            subtotal_fields: self.subtotal.clone(),
            filters: self.filter.clone(),
        })
    }
}

#[derive(clap::Args)]
struct ViewArgs {
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    /// Header derivation; defaults to the configured one
    #[arg(long)]
    headers: Option<HeaderArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Aligned text table
    Text,
    /// HTML table fragment
    Html,
    /// Grid as JSON
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum HeaderArg {
    /// Columns of the first row only
    FirstRow,
    /// Columns of every row
    Union,
}

impl From<HeaderArg> for HeaderStrategy {
    fn from(arg: HeaderArg) -> Self {
        match arg {
            HeaderArg::FirstRow => HeaderStrategy::FirstRow,
            HeaderArg::Union => HeaderStrategy::Union,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match Settings::load_from(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => return fail("Error loading settings", e),
    };

    match cli.command {
        Commands::Render { file, view } => cmd_render(&settings, &file, &view),
        Commands::Stats { file } => cmd_stats(&file),
        Commands::Run {
            source,
            view,
            stats,
        } => cmd_run(&settings, &source, &view, stats).await,
        Commands::Preview { query, view } => cmd_preview(&settings, &query, &view).await,
        Commands::Tables => cmd_tables(&settings).await,
        Commands::Columns { tables } => cmd_columns(&settings, &tables).await,
        Commands::Export {
            source,
            format,
            name,
            out,
        } => {
            let format = format.unwrap_or(settings.export.default_format);
            cmd_export(&settings, &source, format, name, out).await
        }
        Commands::Report { action } => cmd_report(&settings, action).await,
        #[cfg(feature = "ui")]
        Commands::Serve { port } => cmd_serve(&settings, port).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "reportgrid=debug"
    } else {
        "reportgrid=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn fail(context: &str, err: impl Display) -> ExitCode {
    eprintln!("{}: {}", context, err);
    ExitCode::FAILURE
}

fn fail_session(context: &str, err: SessionError) -> ExitCode {
    eprintln!("{}: {}", context, err.user_message());
    ExitCode::FAILURE
}

fn renderer(settings: &Settings, view: &ViewArgs) -> Renderer {
    let renderer = settings.render.renderer();
    match view.headers {
        Some(headers) => renderer.with_header_strategy(headers.into()),
        None => renderer,
    }
}

fn print_grid(grid: &Grid, output: OutputFormat) {
    match output {
        OutputFormat::Text => println!("{}", to_text(grid)),
        OutputFormat::Html => println!("{}", to_html(grid)),
        OutputFormat::Json => match serde_json::to_string_pretty(grid) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error encoding grid: {}", e),
        },
    }
}

fn print_stats(stats: Option<&ReportStatistics>) {
    let Some(stats) = stats else {
        println!("No data");
        return;
    };
    println!(
        "Rows: {} ({} data), generated {}",
        stats.total_rows,
        stats.data_rows,
        stats.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
    for field in &stats.numeric_fields {
        println!(
            "  {}: min {} max {} sum {:.2} avg {} ({} values)",
            field.field,
            show(field.min),
            show(field.max),
            field.sum,
            show(field.avg),
            field.count
        );
    }
    for field in &stats.text_fields {
        println!("  {}: {} distinct values", field.field, field.unique_values.len());
    }
}

fn read_input(file: &Path) -> std::io::Result<String> {
    if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(file)
    }
}

fn read_rows(file: &Path) -> Result<Vec<ResultRow>, String> {
    let source = read_input(file)
        .map_err(|e| format!("Error reading file '{}': {}", file.display(), e))?;
    let value: serde_json::Value =
        serde_json::from_str(&source).map_err(|e| format!("Invalid JSON: {}", e))?;
    decode_rows(&value).map_err(|e| format!("Invalid result rows: {}", e))
}

fn read_json<T: serde::de::DeserializeOwned>(file: &Path) -> Result<T, String> {
    let source = read_input(file)
        .map_err(|e| format!("Error reading file '{}': {}", file.display(), e))?;
    serde_json::from_str(&source).map_err(|e| format!("Invalid JSON in '{}': {}", file.display(), e))
}

fn connect(settings: &Settings) -> Result<ReportClient, ExitCode> {
    ReportClient::from_settings(settings).map_err(|e| fail("Error connecting", e))
}

fn session(settings: &Settings, renderer: Renderer) -> Result<ReportSession, ExitCode> {
    Ok(ReportSession::with_renderer(connect(settings)?, renderer))
}

/// Execute whatever `source` names and return the rendered grid.
async fn execute(session: &ReportSession, source: &SourceArgs) -> Result<Grid, SessionError> {
    if let Some(report) = &source.report {
        session.load_report(report).await?;
        return session.execute_current().await;
    }
    match source.query_config() {
        Some(config) => session.execute(&config).await,
        None => Err(SessionError::NoReport),
    }
}

// ----------------------------------------------------------------------------
// Commands
// ----------------------------------------------------------------------------

fn cmd_render(settings: &Settings, file: &Path, view: &ViewArgs) -> ExitCode {
    let rows = match read_rows(file) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    print_grid(&renderer(settings, view).render(&rows), view.output);
    ExitCode::SUCCESS
}

fn cmd_stats(file: &Path) -> ExitCode {
    match read_rows(file) {
        Ok(rows) => {
            print_stats(ReportStatistics::compute(&rows).as_ref());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_run(settings: &Settings, source: &SourceArgs, view: &ViewArgs, stats: bool) -> ExitCode {
    let session = match session(settings, renderer(settings, view)) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match execute(&session, source).await {
        Ok(grid) => {
            print_grid(&grid, view.output);
            if stats {
                println!();
                print_stats(session.statistics().await.as_ref());
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail_session("Query failed", e),
    }
}

async fn cmd_preview(settings: &Settings, query: &str, view: &ViewArgs) -> ExitCode {
    let session = match session(settings, renderer(settings, view)) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match session.preview(query).await {
        Ok(preview) => {
            print_grid(&preview.grid, view.output);
            if let Some(total) = preview.total_count {
                eprintln!("Showing {} of {} rows", preview.rows.len(), total);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail_session("Preview failed", e),
    }
}

async fn cmd_tables(settings: &Settings) -> ExitCode {
    let client = match connect(settings) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.get_available_tables().await {
        Ok(tables) => {
            for table in tables {
                println!("{}", table);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail("Error listing tables", e.user_message()),
    }
}

async fn cmd_columns(settings: &Settings, tables: &[String]) -> ExitCode {
    let client = match connect(settings) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut status = ExitCode::SUCCESS;
    for (table, result) in client.get_columns_batch(tables).await {
        match result {
            Ok(columns) => {
                println!("{}:", table);
                for column in columns {
                    let nullable = if column.is_nullable { "NULL" } else { "NOT NULL" };
                    println!("  {} {} {}", column.name, column.data_type, nullable);
                }
            }
            Err(e) => {
                eprintln!("Error describing '{}': {}", table, e.user_message());
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}

async fn cmd_export(
    settings: &Settings,
    source: &SourceArgs,
    format: ExportFormat,
    name: Option<String>,
    out: Option<PathBuf>,
) -> ExitCode {
    let session = match session(settings, settings.render.renderer()) {
        Ok(s) => s,
        Err(code) => return code,
    };

    if let Err(e) = execute(&session, source).await {
        return fail_session("Query failed", e);
    }

    let name = name
        .or_else(|| source.report.clone())
        .unwrap_or_else(|| export_report_name(Utc::now()));

    let receipt = match session.export(format, &name).await {
        Ok(r) => r,
        Err(e) => return fail_session("Export failed", e),
    };

    match (&receipt.content, out) {
        (Some(content), Some(path)) => {
            if let Err(e) = fs::write(&path, content) {
                return fail(&format!("Error writing '{}'", path.display()), e);
            }
            println!("Exported {} to {}", format, path.display());
        }
        (Some(content), None) => print!("{}", content),
        (None, _) => {
            println!(
                "Exported {} as {}",
                format,
                receipt.filename.as_deref().unwrap_or(&name)
            );
        }
    }
    ExitCode::SUCCESS
}

async fn cmd_report(settings: &Settings, action: ReportAction) -> ExitCode {
    if let ReportAction::Validate { file } = &action {
        return cmd_report_validate(file);
    }

    let client = match connect(settings) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match action {
        ReportAction::Get { name } => match client.get_report(&name).await {
            Ok(definition) => match serde_json::to_string_pretty(&definition) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => fail("Error encoding report", e),
            },
            Err(e) => fail("Error loading report", e.user_message()),
        },
        ReportAction::List => match client.list_reports().await {
            Ok(reports) => {
                for report in reports {
                    println!(
                        "{}\t{}\t{}",
                        report.name,
                        report.report_name.as_deref().unwrap_or(""),
                        report.query_type.as_deref().unwrap_or("")
                    );
                }
                ExitCode::SUCCESS
            }
            Err(e) => fail("Error listing reports", e.user_message()),
        },
        ReportAction::Create { file } => {
            let definition: ReportDefinition = match read_json(&file) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            let session = ReportSession::new(client);
            match session.create_report(definition).await {
                Ok(created) => {
                    println!(
                        "{}",
                        created
                            .message
                            .or(created.report_name)
                            .unwrap_or_else(|| "Report created".to_string())
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => fail_session("Error creating report", e),
            }
        }
        ReportAction::Update { name, file } => {
            let changes: serde_json::Value = match read_json(&file) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            match client.update_report(&name, &changes).await {
                Ok(ack) => {
                    println!("{}", ack.message.unwrap_or_else(|| "Report updated".to_string()));
                    ExitCode::SUCCESS
                }
                Err(e) => fail("Error updating report", e.user_message()),
            }
        }
        ReportAction::Delete { name } => match client.delete_report(&name).await {
            Ok(ack) => {
                println!("{}", ack.message.unwrap_or_else(|| "Report deleted".to_string()));
                ExitCode::SUCCESS
            }
            Err(e) => fail("Error deleting report", e.user_message()),
        },
        ReportAction::Validate { .. } => ExitCode::SUCCESS,
    }
}

fn cmd_report_validate(file: &Path) -> ExitCode {
    let definition: ReportDefinition = match read_json(file) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let checks = definition
        .validate()
        .and_then(|()| match definition.query_type {
            QueryType::View => Ok(()),
            _ => validate_sql_query(&definition.report_query),
        })
        .map_err(|e| e.to_string())
        .and_then(|()| {
            definition
                .to_query_config()
                .validate()
                .map_err(|e| e.to_string())
        });

    match checks {
        Ok(()) => {
            println!("✓ {} is valid", definition.report_name);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "ui")]
async fn cmd_serve(settings: &Settings, port: u16) -> ExitCode {
    let client = match connect(settings) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match reportgrid::web::serve(client, settings.render.renderer(), port).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail("Server error", e),
    }
}
