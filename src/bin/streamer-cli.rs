use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use log_streamer::security::TokenClaims;

#[derive(Parser)]
#[command(name = "streamer-cli")]
#[command(about = "Management CLI for the Log Streamer", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5005")]
    url: String,

    /// Bearer token sent with every request
    #[arg(short, long, env = "STREAMER_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the streamer answers
    Alive,
    /// Show version and build date
    Version,
    /// List tailable log files
    List,
    /// Follow a log file until interrupted
    Tail {
        file: String,
    },
    /// Stop the streamer process
    Stop,
    /// Restart the streamer process
    Restart,
    /// Mint a signed token for this streamer
    Token {
        #[arg(long, env = "STREAMER_JWT_SECRET", hide_env_values = true)]
        secret: String,
        #[arg(long, default_value = "streamer-cli")]
        subject: String,
        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    match cli.command {
        Commands::Alive => {
            let res = client.get(format!("{}/alive", cli.url)).send().await?;
            print_text(res).await?;
        }
        Commands::Version => {
            let res = client
                .get(format!("{}/version", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::List => {
            let res = client
                .get(format!("{}/list-files", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Tail { file } => {
            let res = client
                .get(format!("{}/stream-logs", cli.url))
                .query(&[("file", file.as_str())])
                .headers(headers)
                .send()
                .await?;
            follow(res).await?;
        }
        Commands::Stop => {
            let res = client
                .post(format!("{}/stop", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_text(res).await?;
        }
        Commands::Restart => {
            let res = client
                .post(format!("{}/restart", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_text(res).await?;
        }
        Commands::Token { secret, subject, ttl } => {
            let now = chrono::Utc::now().timestamp();
            let claims = TokenClaims {
                sub: Some(subject),
                exp: Some(now + ttl),
                iat: Some(now),
                nbf: None,
            };
            let token = encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret(secret.as_bytes()),
            )?;
            println!("{}", token);
        }
    }

    Ok(())
}

/// Print `data:` payloads of an SSE response as they arrive.
async fn follow(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    if !res.status().is_success() {
        return print_text(res).await;
    }

    let mut body = res.bytes_stream();
    let mut pending = String::new();
    while let Some(chunk) = body.next().await {
        pending.push_str(&String::from_utf8_lossy(&chunk?));
        while let Some(end) = pending.find('\n') {
            let line: String = pending.drain(..=end).collect();
            if let Some(data) = line.trim_end_matches(['\r', '\n']).strip_prefix("data:") {
                println!("{}", data.strip_prefix(' ').unwrap_or(data));
            }
        }
    }
    Ok(())
}

async fn print_text(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if status.is_success() {
        print!("{}", text);
    } else {
        eprintln!("Error: streamer returned status {}", status);
        eprint!("{}", text);
    }
    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: streamer returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
