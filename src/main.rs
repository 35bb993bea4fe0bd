//! fanfuzz - fuzzy-logic fan speed controller
//!
//! Command-line interface: interactive prompt, one-shot evaluation and JSON
//! request processing.
//!
//! Exit codes: 0 success, 1 rejected input, 2 controller failure.

use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use fanfuzz::fuzzy::{DEFAULT_STEP, HUMIDITY, TEMPERATURE};
use fanfuzz::logging::init_tracing;
use fanfuzz::{
    round_to, ErrorResponse, FanConfig, FanError, FuzzyController, FuzzyValue, InferenceSession,
    LinguisticVariable, LogLevel, OutputFormat, Reading, SpeedResponse, SpeedService,
};

#[derive(Parser)]
#[command(name = "fanfuzz")]
#[command(author = "fanfuzz Authors")]
#[command(version)]
#[command(about = "Fuzzy-logic fan speed recommendation from temperature and humidity", long_about = None)]
struct Cli {
    /// Temperature in °C (0-40); prompted for when omitted
    #[arg(short, long, allow_negative_numbers = true)]
    temperature: Option<f64>,

    /// Relative humidity in % (0-100); prompted for when omitted
    #[arg(short = 'u', long, allow_negative_numbers = true)]
    humidity: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Show memberships and rule firing strengths
    #[arg(long)]
    explain: bool,

    /// Process a JSON request body from a file ("-" for stdin)
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,

    /// Decimal places shown for the speed
    #[arg(long)]
    precision: Option<u32>,

    /// Distance between speed samples used for the centroid
    #[arg(long)]
    resolution: Option<f64>,

    /// Configuration file (defaults to the standard search path)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// JSON response body
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn load_config(cli: &Cli) -> Result<FanConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = FanConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            config.apply_env_overrides()?;
            config
        }
        None => FanConfig::load().context("Failed to load configuration")?,
    };

    if let Some(format) = cli.format {
        config.general.format = format.into();
    }
    if let Some(precision) = cli.precision {
        config.general.precision = precision;
    }
    if let Some(resolution) = cli.resolution {
        config.controller.resolution = resolution;
    }
    if cli.verbose {
        config.general.log_level = LogLevel::Verbose;
    }
    if cli.quiet {
        config.general.log_level = LogLevel::Quiet;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(config.general.log_level);

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let owned;
    let resolution = config.controller.resolution;
    let controller: &FuzzyController = if resolution == DEFAULT_STEP {
        FuzzyController::reference()?
    } else {
        owned = FuzzyController::reference_with_step(resolution)?;
        &owned
    };
    debug!(
        samples = controller.sample_count(),
        step = controller.step(),
        "controller ready"
    );

    let service = SpeedService::new(controller).with_precision(config.general.precision);

    if let Some(path) = &cli.request {
        let body = read_request(path)?;
        let reply = service.handle_json(&body);
        info!(status = reply.status, "request processed");
        println!("{}", serde_json::to_string_pretty(&reply.body)?);
        process::exit(exit_code(reply.status));
    }

    let temperature = match cli.temperature {
        Some(t) => t,
        None => prompt("Temperature (0-40 °C): ", TEMPERATURE)?,
    };
    let humidity = match cli.humidity {
        Some(h) => h,
        None => prompt("Humidity (0-100 %): ", HUMIDITY)?,
    };

    let reading = match Reading::new(temperature, humidity) {
        Ok(reading) => reading,
        Err(err) => fail(&err, config.general.format),
    };

    if cli.explain {
        let session = controller.session(&[
            (TEMPERATURE, reading.temperature()),
            (HUMIDITY, reading.humidity()),
        ])?;
        println!(
            "{}",
            render_explanation(&session, controller.output(), config.general.precision)
        );
    }

    match service.recommend(reading) {
        Ok(response) => println!(
            "{}",
            render_speed(&response, config.general.format, config.general.precision)?
        ),
        Err(err) => fail(&err, config.general.format),
    }

    Ok(())
}

fn read_request(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read request from stdin")?;
        Ok(body)
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))
    }
}

fn prompt(label: &str, field: &str) -> Result<f64> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .with_context(|| format!("Failed to read {}", field))?;

    let trimmed = line.trim();
    match trimmed.parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) => fail(
            &FanError::invalid_value(field, format!("'{}'", trimmed)),
            OutputFormat::Text,
        ),
    }
}

fn exit_code(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

fn render_speed(response: &SpeedResponse, format: OutputFormat, precision: u32) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format!(
            "Recommended speed: {:.*} %",
            precision as usize,
            round_to(response.recommended_speed, precision)
        ),
        OutputFormat::Json => serde_json::to_string_pretty(response)?,
    })
}

/// Error text, or the same JSON body the request layer answers with
fn render_error(err: &FanError, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => err.message.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(&ErrorResponse::from(err))
            .unwrap_or_else(|_| err.message.clone()),
    }
}

/// Report an error in the selected format and exit
fn fail(err: &FanError, format: OutputFormat) -> ! {
    match format {
        OutputFormat::Text => eprintln!("{}", render_error(err, format)),
        OutputFormat::Json => println!("{}", render_error(err, format)),
    }
    process::exit(exit_code(err.http_status()))
}

fn degree_lines(lines: &mut Vec<String>, name: &str, value: f64, terms: &[(String, FuzzyValue)]) {
    lines.push(format!("{} = {}", name, value));
    for (term, degree) in terms {
        lines.push(format!("  {:<8} {:.3}", term, degree.value()));
    }
}

/// Input memberships, rule strengths, centroid and the centroid's own
/// membership in each output term
fn render_explanation(session: &InferenceSession, output: &LinguisticVariable, precision: u32) -> String {
    let mut lines = Vec::new();
    for (name, value) in &session.readings {
        if let Some(degrees) = session.degrees_of(name) {
            degree_lines(&mut lines, name, *value, &degrees.terms);
        }
    }

    lines.push("rules:".to_string());
    for activation in &session.activations {
        lines.push(format!(
            "  {:<6} {:.3}  {}",
            activation.rule,
            activation.strength.value(),
            activation.statement
        ));
    }

    match session.defuzzify() {
        Ok(speed) => {
            lines.push(format!("centroid: {:.*}", precision as usize, speed));
            degree_lines(&mut lines, &output.name, round_to(speed, precision), &output.fuzzify(speed));
        }
        Err(_) => lines.push("centroid: undefined (no rule fired)".to_string()),
    }
    lines.join("\n")
}
