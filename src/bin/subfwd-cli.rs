use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, HOST};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "subfwd-cli")]
#[command(about = "Admin client for a running subfwd instance", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Host header identifying the admin surface
    #[arg(long, default_value = "subfwd.com")]
    admin_host: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show uptime and forward counters
    Stats,
    /// Echo the headers the service received
    Headers,
    /// Register a forwarding domain
    Setup {
        domain: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(HOST, HeaderValue::from_str(&cli.admin_host)?);

    match cli.command {
        Commands::Stats => {
            let res = client
                .get(format!("{}/stats", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Headers => {
            let res = client
                .get(format!("{}/headers", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Setup { domain } => {
            let res = client
                .get(format!("{}/setup", cli.url))
                .query(&[("domain", domain.as_str())])
                .headers(headers)
                .send()
                .await?;
            let status = res.status();
            let body = res.text().await?;
            if status.is_success() {
                println!("{} registered", domain);
            } else {
                eprintln!("Setup failed ({}): {}", status, body.trim());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: admin endpoint returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
