//! LEXIVEC CLI Client
//!
//! Interactive command-line client for a running lexivec server.

use std::io::{self, Write};

use clap::Parser;
use serde_json::{json, Value};

/// LEXIVEC CLI - Interactive Client
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

#[derive(Debug)]
enum Command {
    Info,
    Health,
    Stats,
    Embed { word: String },
    Batch { words: Vec<String> },
    Similar { word: String, n: Option<u32> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let base = format!("http://{}:{}", args.host, args.port);
    let client = reqwest::Client::new();

    println!("Connected to lexivec at {}", base);
    println!("Type 'help' for available commands, 'quit' to exit.\n");

    loop {
        print!("lexivec> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("help") {
            print_help();
            continue;
        }

        match parse_command(input) {
            Ok(cmd) => {
                if let Err(e) = execute(&client, &base, cmd).await {
                    eprintln!("Error: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
            }
        }
    }

    Ok(())
}

fn parse_command(input: &str) -> anyhow::Result<Command> {
    let parts: Vec<&str> = input.split_whitespace().collect();

    if parts.is_empty() {
        anyhow::bail!("Empty command");
    }

    let cmd = parts[0].to_uppercase();

    match cmd.as_str() {
        "INFO" => Ok(Command::Info),
        "HEALTH" => Ok(Command::Health),
        "STATS" => Ok(Command::Stats),

        "EMBED" => {
            if parts.len() < 2 {
                anyhow::bail!("EMBED requires a word: EMBED <word>");
            }
            Ok(Command::Embed {
                word: parts[1].to_string(),
            })
        }

        "BATCH" => {
            if parts.len() < 2 {
                anyhow::bail!("BATCH requires words: BATCH <word> [word ...]");
            }
            Ok(Command::Batch {
                words: parts[1..].iter().map(|s| s.to_string()).collect(),
            })
        }

        "SIMILAR" => {
            if parts.len() < 2 {
                anyhow::bail!("SIMILAR requires a word: SIMILAR <word> [n]");
            }
            let n = if parts.len() > 2 {
                Some(parts[2].parse::<u32>()?)
            } else {
                None
            };
            Ok(Command::Similar {
                word: parts[1].to_string(),
                n,
            })
        }

        _ => anyhow::bail!("Unknown command: {}. Type 'help' for available commands.", cmd),
    }
}

async fn execute(client: &reqwest::Client, base: &str, cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Info => {
            let body: Value = client.get(base).send().await?.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Command::Health => {
            let body: Value = client
                .get(format!("{}/health", base))
                .send()
                .await?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Command::Stats => {
            let body: Value = client
                .get(format!("{}/stats", base))
                .send()
                .await?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Command::Embed { word } => {
            let response = client
                .post(format!("{}/embedding", base))
                .json(&json!({ "word": word }))
                .send()
                .await?;
            if !response.status().is_success() {
                print_detail(response).await?;
                return Ok(());
            }
            let body: Value = response.json().await?;
            let embedding = body["embedding"].as_array().cloned().unwrap_or_default();
            println!("{} ({} dimensions)", word, embedding.len());
            print_vector_head(&embedding);
        }

        Command::Batch { words } => {
            let response = client
                .post(format!("{}/embeddings", base))
                .json(&json!({ "words": words }))
                .send()
                .await?;
            if !response.status().is_success() {
                print_detail(response).await?;
                return Ok(());
            }
            let body: Value = response.json().await?;
            for word in &words {
                match body["results"][word]["embedding"].as_array() {
                    Some(v) => println!("{}: {} dimensions", word, v.len()),
                    None => println!("{}: (not in vocabulary)", word),
                }
            }
        }

        Command::Similar { word, n } => {
            let mut url = format!("{}/similar/{}", base, word);
            if let Some(n) = n {
                url.push_str(&format!("?n={}", n));
            }
            let response = client.get(url).send().await?;
            if !response.status().is_success() {
                print_detail(response).await?;
                return Ok(());
            }
            let body: Value = response.json().await?;
            if let Some(items) = body["similar_words"].as_array() {
                for item in items {
                    println!(
                        "{:<20} {:.4}",
                        item["word"].as_str().unwrap_or("?"),
                        item["similarity"].as_f64().unwrap_or(0.0)
                    );
                }
            }
        }
    }

    Ok(())
}

async fn print_detail(response: reqwest::Response) -> anyhow::Result<()> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    match body["detail"].as_str() {
        Some(detail) => eprintln!("{}: {}", status, detail),
        None => eprintln!("{}", status),
    }
    Ok(())
}

fn print_vector_head(embedding: &[Value]) {
    let head: Vec<String> = embedding
        .iter()
        .take(8)
        .map(|v| format!("{:.4}", v.as_f64().unwrap_or(0.0)))
        .collect();
    let suffix = if embedding.len() > 8 { ", ..." } else { "" };
    println!("[{}{}]", head.join(", "), suffix);
}

fn print_help() {
    println!(
        r#"
Available commands:

  INFO                     - Model and service information
  EMBED <word>             - Embedding vector for a single word
  BATCH <word> [word ...]  - Embeddings for multiple words
  SIMILAR <word> [n]       - Top n most similar words (default 10)
  HEALTH                   - Server health summary
  STATS                    - Request counters and latency

  help                     - Show this help
  quit / exit              - Exit the CLI

Examples:
  EMBED cat
  BATCH cat dog notaword
  SIMILAR cat 5
"#
    );
}
