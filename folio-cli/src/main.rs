use clap::{Parser, Subcommand, ValueEnum};
use folio::Store;
use std::process;

/// Folio CLI: read and write records in a Folio data directory
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Path to the data directory (default: current directory)
    #[arg(long, default_value = ".")]
    data_dir: String,

    /// Output format
    #[arg(long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// One JSON value per line
    Compact,
}

#[derive(Subcommand)]
enum Command {
    /// Store a record, replacing any previous one
    Write {
        /// Collection name
        collection: String,
        /// Resource name
        resource: String,
        /// Record as JSON text
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        json: Option<String>,
        /// Read the record from a file instead
        #[arg(long)]
        file: Option<String>,
    },

    /// Print a single record
    Read {
        /// Collection name
        collection: String,
        /// Resource name
        resource: String,
    },

    /// Print every record in a collection
    ReadAll {
        /// Collection name
        collection: String,
    },

    /// List resource names in a collection
    List {
        /// Collection name
        collection: String,
    },

    /// Delete a record, or the whole collection when no resource is given
    Delete {
        /// Collection name
        collection: String,
        /// Resource name
        resource: Option<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&cli.data_dir)?;

    match cli.command {
        Command::Write {
            collection,
            resource,
            json,
            file,
        } => {
            let text = match (json, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read record file '{path}': {e}"))?,
                (None, None) => return Err("no record given".into()),
            };
            let value: serde_json::Value = serde_json::from_str(&text)?;
            store.write(&collection, &resource, &value)?;
            print_output(
                &serde_json::json!({ "ok": true, "collection": collection, "resource": resource }),
                &cli.format,
            )?;
        }

        Command::Read {
            collection,
            resource,
        } => {
            let value: serde_json::Value = store.read(&collection, &resource)?;
            print_output(&value, &cli.format)?;
        }

        Command::ReadAll { collection } => {
            let raw = store.read_all(&collection)?;
            let values: Vec<serde_json::Value> = folio::decode_all(&raw)?;
            print_output(&serde_json::Value::Array(values), &cli.format)?;
        }

        Command::List { collection } => {
            let names = store.list(&collection)?;
            print_output(&serde_json::json!(names), &cli.format)?;
        }

        Command::Delete {
            collection,
            resource,
        } => {
            let resource = resource.unwrap_or_default();
            store.delete(&collection, &resource)?;
            log::info!("Deleted {collection}/{resource}");
            print_output(
                &serde_json::json!({ "ok": true, "deleted": { "collection": collection, "resource": resource } }),
                &cli.format,
            )?;
        }
    }

    Ok(())
}

fn print_output(
    value: &serde_json::Value,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Compact => println!("{}", serde_json::to_string(value)?),
    }
    Ok(())
}
