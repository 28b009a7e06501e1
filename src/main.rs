use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use realgold_patch::cli;
use realgold_patch::timeline::parse_label;
use realgold_patch::verify::Suite;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "realgold-patch")]
#[command(about = "Patch the RealGold financial model into a fully dynamic workbook")]
#[command(long_about = "realgold-patch - RealGold financial model patcher

Fixes the unitization fee, rebuilds the XAUconfig month timeline, turns the
Mine Inventory onboard dates into dropdowns and rewires Resource Supply,
Token Supply, Token Demand and the cashflow headers so that changing a date
redistributes every row. A Model Health dashboard is added as the first sheet.

COMMANDS:
  patch       - Patch the model (default when no command is given)
  retime      - Move the timeline of a patched model to a new start month
  reschedule  - Change mine onboard dates in a patched model
  audit       - List #REF! errors
  verify      - Check a patched model

EXAMPLES:
  realgold-patch                                   # attachment_3.xlsx → patched copy
  realgold-patch patch -i model.xlsx -o out.xlsx --config plan.yaml
  realgold-patch retime out.xlsx --start 2025-12-01
  realgold-patch retime out.xlsx --start \"Dec '25\"
  realgold-patch reschedule out.xlsx --set \"2=Jan '26\" --set \"3=Mar '26\"
  realgold-patch verify out.xlsx --suite rows

Set RUST_LOG=realgold_patch=debug for diagnostics.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch the model (default)
    Patch(PatchArgs),

    /// Rewrite the XAUconfig timeline of a patched model for a new start month
    Retime {
        /// Patched workbook
        file: PathBuf,

        /// First month of the timeline: YYYY-MM-DD (day is ignored) or a label such as "Dec '25"
        #[arg(long, value_parser = parse_start)]
        start: NaiveDate,

        /// Output path [default: <file>_RETIMED.xlsx]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Patch plan (months, gold price curve)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Set mine onboard dates and confirm the formula chain is intact
    Reschedule {
        /// Patched workbook
        file: PathBuf,

        /// Mine Inventory row and month label, e.g. "2=Jan '26"
        #[arg(long = "set", value_name = "ROW=LABEL", required = true)]
        assignments: Vec<String>,

        /// Output path [default: <file>_RESCHEDULED.xlsx]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List every #REF! error, grouped by sheet
    Audit {
        /// Workbook to scan
        file: PathBuf,
    },

    /// Verify a patched model
    Verify {
        /// Workbook to verify [default: the plan's output path]
        file: Option<PathBuf>,

        /// Check suite to run
        #[arg(short, long, value_enum, default_value_t = Suite::All)]
        suite: Suite,

        /// Patch plan the model was built from
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Default)]
struct PatchArgs {
    /// Source workbook [default: attachment_3.xlsx]
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Patched workbook [default: RealGold_Finmodel_V2_COMPLETE_DYNAMIC.xlsx]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Patch plan (YAML); flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Clear #REF! cells in Mine Inventory before rebuilding
    #[arg(long)]
    clear_ref_errors: bool,

    /// Show cell counts per phase and debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn parse_start(text: &str) -> Result<NaiveDate, String> {
    text.parse::<NaiveDate>()
        .ok()
        .or_else(|| parse_label(text))
        .ok_or_else(|| format!("'{}' is neither YYYY-MM-DD nor a month label like \"Jan '25\"", text))
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "realgold_patch=debug"
    } else {
        "realgold_patch=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_plan(path: Option<PathBuf>) -> anyhow::Result<realgold_patch::PatchConfig> {
    let shown = path.as_ref().map(|p| p.display().to_string());
    cli::load_config(path.as_deref())
        .with_context(|| format!("Failed to load patch plan {}", shown.unwrap_or_default()))
}

fn run(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Patch(args) => {
            let mut config = load_plan(args.config)?;
            if let Some(input) = args.input {
                config.input = input;
            }
            if let Some(output) = args.output {
                config.output = output;
            }
            config.clear_ref_errors |= args.clear_ref_errors;
            cli::patch(config, args.verbose)?;
        }

        Commands::Retime {
            file,
            start,
            output,
            config,
        } => cli::retime(file, start, output, load_plan(config)?)?,

        Commands::Reschedule {
            file,
            assignments,
            output,
        } => cli::reschedule(file, assignments, output)?,

        Commands::Audit { file } => cli::audit(file)?,

        Commands::Verify {
            file,
            suite,
            config,
            json,
        } => {
            if !cli::verify(file, suite, load_plan(config)?, json)? {
                return Ok(ExitCode::from(1));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Patch(PatchArgs::default()));

    let verbose = matches!(&command, Commands::Patch(args) if args.verbose);
    init_tracing(verbose);

    match run(command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("\n{} {}", "❌ ERROR:".bold().red(), err);
            for cause in err.chain().skip(1) {
                eprintln!("   caused by: {}", cause);
            }
            ExitCode::from(1)
        }
    }
}
