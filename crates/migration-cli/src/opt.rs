//! The `structopt`-derived command-line surface.

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "schema-diff", about = "Diffs two live database schemas and synthesizes a migration")]
pub struct Opt {
    /// Source database connection string.
    #[structopt(long)]
    pub source: String,

    /// Target database connection string.
    #[structopt(long)]
    pub target: String,

    /// Engine family both databases belong to.
    #[structopt(long = "type")]
    pub engine_type: String,

    /// Output format.
    #[structopt(long, default_value = "console")]
    pub output: OutputFormat,

    /// Comma-separated list of fully-qualified table names to include.
    #[structopt(long)]
    pub tables: Option<String>,

    /// Comma-separated list of fully-qualified table names to exclude.
    #[structopt(long)]
    pub ignore: Option<String>,

    /// Name of the generated migration.
    #[structopt(long = "migration-name")]
    pub migration_name: Option<String>,

    /// Install a DEBUG-level tracing subscriber instead of INFO.
    #[structopt(long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Console,
    Sql,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<OutputFormat, String> {
        match s {
            "console" => Ok(OutputFormat::Console),
            "sql" => Ok(OutputFormat::Sql),
            "json" => Ok(OutputFormat::Json),
            "markdown" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format '{}', expected one of console|sql|json|markdown", other)),
        }
    }
}
