//! ordctl - command-line client for the mobile order API
//!
//! Places guest orders, logs in and checks order status from a terminal.

use anyhow::Context;
use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use std::process;
use tracing::error;

/// ordctl - mobile order API client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Server URL to connect to
    #[arg(
        short,
        long,
        default_value = "http://localhost:8080",
        env = "ORDCTL_URL"
    )]
    url: String,

    /// Bearer token from `ordctl login`
    #[arg(short, long, env = "ORDCTL_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Quick health check
    Health,

    /// List the products of a shop
    Products {
        /// Shop ID
        shop_id: i64,
    },

    /// Place a guest order
    Order {
        /// Shop ID
        shop_id: i64,

        /// Item and quantity as `<item_id>:<quantity>`, repeatable
        #[arg(short, long = "item", value_parser = parse_item, required = true)]
        items: Vec<(i64, i64)>,
    },

    /// Log in and print the token
    Login {
        /// Account email
        email: String,

        /// Guest order token to claim
        #[arg(short, long)]
        guest_token: Option<String>,
    },

    /// Status and waiting count of one of your orders
    Status {
        /// Order ID
        order_id: i64,
    },

    /// Your active orders
    Orders,
}

/// Parse `<item_id>:<quantity>`
fn parse_item(s: &str) -> Result<(i64, i64), String> {
    let (item_id, quantity) = s
        .split_once(':')
        .ok_or_else(|| format!("expected <item_id>:<quantity>, got '{}'", s))?;
    let item_id = item_id
        .trim()
        .parse()
        .map_err(|_| format!("invalid item id '{}'", item_id))?;
    let quantity = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", quantity))?;
    Ok((item_id, quantity))
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let client = Client::new();
    let base_url = cli.url.trim_end_matches('/');
    let token = cli.token.as_deref();

    let result = match cli.command {
        Commands::Health => handle_health(&client, base_url).await,
        Commands::Products { shop_id } => {
            let url = format!("{}/shops/{}/products", base_url, shop_id);
            send(client.get(&url)).await
        }
        Commands::Order { shop_id, items } => {
            let url = format!("{}/shops/{}/guest-orders", base_url, shop_id);
            let items: Vec<Value> = items
                .into_iter()
                .map(|(item_id, quantity)| json!({ "item_id": item_id, "quantity": quantity }))
                .collect();
            send(client.post(&url).json(&json!({ "items": items }))).await
        }
        Commands::Login { email, guest_token } => {
            let url = format!("{}/auth/login", base_url);
            let body = json!({ "email": email, "guest_order_token": guest_token });
            send(client.post(&url).json(&body)).await
        }
        Commands::Status { order_id } => match require_token(token) {
            Ok(token) => {
                let url = format!("{}/orders/{}/status", base_url, order_id);
                send(client.get(&url).bearer_auth(token)).await
            }
            Err(e) => Err(e),
        },
        Commands::Orders => match require_token(token) {
            Ok(token) => {
                let url = format!("{}/orders", base_url);
                send(client.get(&url).bearer_auth(token)).await
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        process::exit(1);
    }
}

fn require_token(token: Option<&str>) -> anyhow::Result<&str> {
    token.context("this command needs --token or ORDCTL_TOKEN")
}

async fn handle_health(client: &Client, base_url: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", base_url);
    let response = client.get(&url).send().await?;

    if response.status().is_success() {
        println!("{}", response.text().await?);
        Ok(())
    } else {
        anyhow::bail!("Health check failed with status: {}", response.status())
    }
}

/// Send a request and pretty-print the JSON response
async fn send(request: RequestBuilder) -> anyhow::Result<()> {
    let response = request.send().await?;
    print_response(response).await
}

async fn print_response(response: Response) -> anyhow::Result<()> {
    let status = response.status();
    let json: Value = response
        .json()
        .await
        .with_context(|| format!("unexpected response body (status {})", status))?;

    if status.is_success() {
        println!("{}", serde_json::to_string_pretty(&json)?);
        Ok(())
    } else {
        let code = json["err_code"].as_str().unwrap_or("U000");
        let message = json["message"].as_str().unwrap_or("unknown error");
        anyhow::bail!("{} {}: {}", status, code, message)
    }
}
