use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "steer-ctl")]
#[command(about = "Control CLI for the steer load balancer", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a backend
    Add {
        /// Backend base URL, e.g. http://127.0.0.1:3000
        backend: String,
        #[arg(short, long, default_value_t = 1)]
        weight: u32,
    },
    /// Deregister a backend
    Remove {
        backend: String,
    },
    /// Switch the scheduling strategy (round_robin, weighted, least_conn)
    Strategy {
        algorithm: String,
    },
    /// List backend health and in-flight counts
    List,
    /// Show request distribution per period
    Stats {
        /// Comma-separated periods (5m,30m,1h,6h,24h,all)
        #[arg(short, long)]
        periods: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let response = match cli.command {
        Commands::Add { backend, weight } => {
            client
                .post(format!("{}/_control/add", cli.url))
                .json(&json!({ "url": backend, "weight": weight }))
                .send()
                .await?
        }
        Commands::Remove { backend } => {
            client
                .post(format!("{}/_control/remove", cli.url))
                .json(&json!({ "url": backend }))
                .send()
                .await?
        }
        Commands::Strategy { algorithm } => {
            client
                .post(format!("{}/_control/scheduler", cli.url))
                .json(&json!({ "algorithm": algorithm }))
                .send()
                .await?
        }
        Commands::List => client.get(format!("{}/_control/list", cli.url)).send().await?,
        Commands::Stats { periods } => {
            let mut request = client.get(format!("{}/_control/stats", cli.url));
            if let Some(periods) = periods {
                request = request.query(&[("periods", periods)]);
            }
            request.send().await?
        }
    };

    print_response(response).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: control API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
