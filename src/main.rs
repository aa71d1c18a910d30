use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use inviteflow::{is_flow_complete, resume_step, util, Config, FlowStorage};

#[derive(Parser)]
#[command(
    name = "inviteflow",
    about = "Inspect and reset persisted invite flow progress",
    version
)]
struct Cli {
    /// Override the data directory (default ~/.inviteflow)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every persisted flow record
    List,
    /// Print one record as JSON
    Show { invite_code: String },
    /// Print the step a returning user would resume at
    Resume {
        invite_code: String,
        /// Treat the invite as having a password gate configured
        #[arg(long)]
        password_gate: bool,
    },
    /// Erase one record
    Reset { invite_code: String },
    /// Erase every record under the namespace
    ResetAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir.clone());

    // Initialize logging to file (~/.inviteflow/logs/inviteflow.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();

    let config = Config::load();
    let storage = FlowStorage::open(&config);

    match cli.command {
        Command::List => {
            let records = storage.records();
            if records.is_empty() {
                println!("No flow records found");
            } else {
                for record in records {
                    println!(
                        "{}  step={}  started_at={}",
                        record.invite_code,
                        record.current_step.as_str(),
                        record.started_at
                    );
                }
            }
        }
        Command::Show { invite_code } => match storage.read(&invite_code) {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("No record for invite code {invite_code}"),
        },
        Command::Resume {
            invite_code,
            password_gate,
        } => match storage.read(&invite_code) {
            Some(record) => {
                println!("{}", resume_step(&record, password_gate).as_str());
                if is_flow_complete(Some(&record)) {
                    eprintln!("note: flow is already complete");
                }
            }
            // A brand-new or invalidated flow starts over
            None => println!("welcome"),
        },
        Command::Reset { invite_code } => {
            storage.erase(&invite_code);
            println!("Erased {invite_code}");
        }
        Command::ResetAll => {
            let removed = storage.erase_all();
            println!("Erased {removed} record(s)");
        }
    }

    Ok(())
}
