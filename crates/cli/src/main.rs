use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use impf_core::status::{is_at_most, ordinal};
use impf_core::{
    parse_status, CoreResult, DateTimeWireCodec, DossierStatus, StatusGroup, TimezonePolicy,
    TimezoneSource,
};

#[derive(Parser)]
#[command(name = "impf")]
#[command(about = "Vaccination dossier wire and status tooling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite date fields of a JSON document into the canonical wire format
    Normalise {
        /// JSON file to read (stdin when omitted)
        file: Option<PathBuf>,
        /// How zone-less values are interpreted: local or utc
        #[arg(long, default_value = "local")]
        policy: TimezonePolicy,
        /// Local timezone: system or an offset such as +01:00
        #[arg(long, default_value = "system")]
        offset: TimezoneSource,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Show the ordinal and group memberships of a dossier status
    Status {
        /// Status wire name, e.g. GEBUCHT
        #[arg(value_parser = parse_status)]
        status: DossierStatus,
    },
    /// Check whether one dossier status ranks at or below another
    Compare {
        /// Status expected to rank lower
        #[arg(value_parser = parse_status)]
        status: DossierStatus,
        /// Status expected to rank higher
        #[arg(value_parser = parse_status)]
        other: DossierStatus,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("impf_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Normalise {
            file,
            policy,
            offset,
            pretty,
        }) => {
            let input = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let codec = DateTimeWireCodec::new(policy, offset);
            println!("{}", normalise_text(&codec, &input, pretty)?);
        }
        Some(Commands::Status { status }) => {
            println!("{}", describe_status(status));
        }
        Some(Commands::Compare { status, other }) => {
            // A rejected booster comparison ends the process with a non-zero exit code.
            println!("{}", describe_comparison(status, other)?);
        }
        None => {
            println!("Use 'impf --help' for commands");
        }
    }

    Ok(())
}

fn normalise_text(
    codec: &DateTimeWireCodec,
    input: &str,
    pretty: bool,
) -> serde_json::Result<String> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    let normalised = codec.normalise(&value).unwrap_or(value);
    if pretty {
        serde_json::to_string_pretty(&normalised)
    } else {
        serde_json::to_string(&normalised)
    }
}

fn describe_comparison(status: DossierStatus, other: DossierStatus) -> CoreResult<String> {
    let relation = if is_at_most(status, other)? { "<=" } else { ">" };
    Ok(format!("{} {} {}", status, relation, other))
}

fn describe_status(status: DossierStatus) -> String {
    let groups: Vec<String> = StatusGroup::groups_of(status)
        .into_iter()
        .map(|group| format!("{:?}", group))
        .collect();
    let groups = if groups.is_empty() {
        "-".to_string()
    } else {
        groups.join(", ")
    };
    format!(
        "Status: {}, Ordinal: {}, Groups: {}",
        status,
        ordinal(status),
        groups
    )
}
