use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enrollment_sync::{
    count_by_track, extract_roster, load_records, read_spreadsheet, run_year_sync,
    upload_records, write_records, ColumnLayout, Config, Console, ConsoleDisambiguator,
    Credentials, DirectoryClient, FieldIds, OptionMaps, DEFAULT_API_BASE,
};

/// Sync class rosters into Planning Center People
#[derive(Parser, Debug)]
#[command(name = "enrollment-sync")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Personal access token application id
    #[arg(long, env = "PCO_AUTH_TOKEN", hide_env_values = true)]
    auth_token: String,

    /// Personal access token secret
    #[arg(long, env = "PCO_AUTH_SECRET", hide_env_values = true)]
    auth_secret: String,

    #[arg(long, env = "PCO_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Wait between rate-limited attempts
    #[arg(long, env = "RATE_LIMIT_DELAY_MS", default_value_t = 1000)]
    rate_limit_delay_ms: u64,

    /// Give up after this many rate-limited retries (default: never)
    #[arg(long, env = "RATE_LIMIT_MAX_RETRIES")]
    rate_limit_max_retries: Option<u32>,

    #[arg(long, env = "MENTOR_FIELD")]
    mentor_field: Option<String>,

    #[arg(long, env = "SDOE_SESSION_FIELD")]
    sdoe_session_field: Option<String>,

    #[arg(long, env = "MRMRS_SESSION_FIELD")]
    mrmrs_session_field: Option<String>,

    #[arg(long, env = "START_YEAR_FIELD")]
    start_year_field: Option<String>,

    #[arg(long, env = "END_YEAR_FIELD")]
    end_year_field: Option<String>,
}

impl ConnectionArgs {
    fn into_config(self) -> Config {
        Config::new(
            self.api_base,
            Credentials::new(self.auth_token, self.auth_secret),
        )
        .with_fields(FieldIds {
            mentor: self.mentor_field,
            sdoe_session: self.sdoe_session_field,
            mrmrs_session: self.mrmrs_session_field,
            start_year: self.start_year_field,
            end_year: self.end_year_field,
        })
        .with_retry(self.rate_limit_delay_ms, self.rate_limit_max_retries)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse the master table and resolve every student against the directory
    Extract {
        #[arg(default_value = "data/Master-Table 1.csv")]
        input: PathBuf,

        #[arg(short, long, default_value = "data/parser_output.csv")]
        output: PathBuf,
    },

    /// Write mentors and class sessions from an extraction output
    Upload {
        #[arg(short, long, default_value = "data/parser_output.csv")]
        input: PathBuf,
    },

    /// Enter start/end years for couples from the console
    Years,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "enrollment_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.connection.into_config();
    let client = DirectoryClient::connect(&config)?;

    match cli.command {
        Command::Extract { input, output } => run_extract(&client, input, output),
        Command::Upload { input } => run_upload(&client, &config, input),
        Command::Years => run_years(&client, &config),
    }
}

fn run_extract(client: &DirectoryClient, input: PathBuf, output: PathBuf) -> Result<()> {
    println!("📋 Roster extraction");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load spreadsheet
    println!("\n📂 Loading {}...", input.display());
    let rows = read_spreadsheet(&input)?;
    println!("✓ Loaded {} rows", rows.len());

    // 2. Resolve every name (may prompt)
    println!("\n🔍 Resolving names...");
    let mut operator = ConsoleDisambiguator::new(Console::stdio());
    let records = extract_roster(rows, &ColumnLayout::default(), client, &mut operator)?;

    // 3. Write intermediate file
    println!("\n💾 Writing {}...", output.display());
    write_records(&output, &records)?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (track, count) in count_by_track(&records) {
        println!("✓ {}: {} records", track, count);
    }
    println!("✅ Extraction complete: {} records", records.len());

    Ok(())
}

fn run_upload(client: &DirectoryClient, config: &Config, input: PathBuf) -> Result<()> {
    println!("📤 Field data upload");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let fields = config.fields.upload_fields()?;

    // 1. Load records
    println!("\n📂 Loading {}...", input.display());
    let records = load_records(&input)?;
    println!("✓ Loaded {} records", records.len());

    // 2. Load option maps
    println!("\n🔧 Loading field options...");
    let maps = OptionMaps::load(client, &fields)?;
    println!("✓ Field options loaded");

    // 3. Validate + write
    println!("\n💾 Writing field data...");
    let report = upload_records(client, &records, &fields, &maps)
        .context("Upload aborted")?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Processed: {}", report.processed);
    println!("✓ Mentors written: {}", report.mentors_written);
    println!("✓ Sessions written: {}", report.sessions_written);
    println!("✓ Already entered (skipped): {}", report.skipped_existing);
    if report.sanity_failures > 0 {
        println!("⚠️  Sanity check failures: {}", report.sanity_failures);
    }
    if let Some(seconds) = report.elapsed_seconds() {
        println!("✅ Upload complete in {}s", seconds);
    }

    Ok(())
}

fn run_years(client: &DirectoryClient, config: &Config) -> Result<()> {
    let fields = config.fields.year_fields()?;

    println!("🗓️  Year sync - Ctrl+D to finish");
    let mut console = Console::stdio();
    let summary = run_year_sync(client, &fields, &mut console)?;

    println!("\n✅ {} couples updated", summary.couples);
    println!("✓ Years written: {}", summary.written);
    println!("✓ Already entered (skipped): {}", summary.skipped_existing);

    Ok(())
}
