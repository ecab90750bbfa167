use clap::Parser;
use std::io;
use tracing_subscriber::EnvFilter;

use finbuddy::cli::{self, Cli, Command};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finbuddy=info,tower_http=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();
    let result = match cli.command {
        Command::Serve { host, port } => {
            if let Err(e) = finbuddy::api::run_http_server(cli::serve_addr(host, port)).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Sip {
            monthly,
            rate,
            years,
            mode,
            json,
        } => cli::run_sip(monthly, rate, years, mode.into(), json, &mut stdout),
        Command::Budget {
            income,
            template,
            categories,
            csv,
        } => cli::run_budget(income, template.into(), &categories, csv, &mut stdout),
        Command::EmergencyFund { monthly_expenses } => {
            cli::run_emergency_fund(monthly_expenses, &mut stdout)
        }
        Command::Quiz => cli::run_quiz(&mut io::stdin().lock(), &mut stdout),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
