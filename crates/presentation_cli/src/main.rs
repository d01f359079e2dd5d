//! Catalog CLI
//!
//! Command-line interface for administration and smoke testing.

#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use infrastructure::ApiKeyHasher;
use presentation_http::ApiDoc;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

/// Catalog CLI
#[derive(Parser, Debug)]
#[command(name = "catalog-cli")]
#[command(author, version, about = "Product catalog administration CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hash an admin API key using Argon2 for secure storage in configuration
    ///
    /// The output can be pasted into config.toml.
    /// Example: catalog-cli hash-api-key sk-my-secret-key --name ops
    HashApiKey {
        /// The plaintext API key to hash
        api_key: String,

        /// Name recorded for the key in logs
        #[arg(short, long, default_value = "admin")]
        name: String,

        /// Verify the hash by re-checking the key against it
        #[arg(long)]
        verify: bool,
    },

    /// Check server readiness (used by container health checks)
    Health {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,
    },

    /// List products
    Products {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,

        /// Admin API key; without one only active products are listed
        #[arg(long, env = "CATALOG_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// draft, active or all
        #[arg(long)]
        status: Option<String>,

        /// Exact category (case-insensitive)
        #[arg(long)]
        category: Option<String>,

        /// Substring of name or description
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        limit: Option<u32>,

        /// name, price, createdAt or stock
        #[arg(long)]
        sort_by: Option<String>,

        /// asc or desc
        #[arg(long)]
        sort_order: Option<String>,
    },

    /// Show a single product
    Product {
        /// Product ID
        id: String,

        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,

        /// Admin API key; needed to see drafts
        #[arg(long, env = "CATALOG_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// List categories of active products
    Categories {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,
    },

    /// Print the OpenAPI document
    Openapi {
        /// Emit YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Format endpoint URL
fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Snippet to paste into config.toml
fn config_snippet(hash: &str, name: &str) -> String {
    format!("[[security.api_keys]]\nhash = \"{hash}\"\nname = \"{name}\"")
}

/// Non-empty listing parameters in wire names
fn list_params(
    status: Option<String>,
    category: Option<String>,
    search: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
    sort_by: Option<String>,
    sort_order: Option<String>,
) -> Vec<(&'static str, String)> {
    [
        ("status", status),
        ("category", category),
        ("search", search),
        ("page", page.map(|p| p.to_string())),
        ("limit", limit.map(|l| l.to_string())),
        ("sortBy", sort_by),
        ("sortOrder", sort_order),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| (key, v)))
    .collect()
}

fn with_api_key(
    request: reqwest::RequestBuilder,
    api_key: Option<&str>,
) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) => request.bearer_auth(key),
        None => request,
    }
}

/// Send `request` and pretty-print the JSON body; non-2xx exits with 1
async fn print_response(request: reqwest::RequestBuilder) -> anyhow::Result<()> {
    let resp = request.send().await?;
    let status = resp.status();
    let body = resp.json::<serde_json::Value>().await?;
    debug!(%status, "Response received");

    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        println!("❌ HTTP {status}");
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = reqwest::Client::new();

    match cli.command {
        Commands::HashApiKey {
            api_key,
            name,
            verify,
        } => {
            let hasher = ApiKeyHasher::new();

            match hasher.hash(&api_key) {
                Ok(hash) => {
                    println!("🔐 API Key Hash (Argon2id):");
                    println!();
                    println!("{hash}");
                    println!();
                    println!("📋 Add to config.toml:");
                    println!("{}", config_snippet(&hash, &name));

                    if verify {
                        println!();
                        match hasher.verify(&api_key, &hash) {
                            Ok(true) => println!("✅ Verification: Hash verified successfully"),
                            Ok(false) => {
                                println!("❌ Verification: Hash does NOT match (unexpected)");
                            },
                            Err(e) => println!("❌ Verification error: {e}"),
                        }
                    }
                },
                Err(e) => {
                    println!("❌ Failed to hash API key: {e}");
                    std::process::exit(1);
                },
            }
        },

        Commands::Health { url } => {
            match client.get(endpoint_url(&url, "/ready")).send().await {
                Ok(resp) if resp.status().is_success() => {
                    println!("✅ Healthy");
                    std::process::exit(0);
                },
                Ok(resp) => {
                    println!("❌ Unhealthy: HTTP {}", resp.status());
                    std::process::exit(1);
                },
                Err(e) => {
                    println!("❌ Unhealthy: {e}");
                    std::process::exit(1);
                },
            }
        },

        Commands::Products {
            url,
            api_key,
            status,
            category,
            search,
            page,
            limit,
            sort_by,
            sort_order,
        } => {
            let params = list_params(status, category, search, page, limit, sort_by, sort_order);
            let request = client
                .get(endpoint_url(&url, "/products"))
                .query(&params);
            print_response(with_api_key(request, api_key.as_deref())).await?;
        },

        Commands::Product { id, url, api_key } => {
            let request = client.get(endpoint_url(&url, &format!("/products/{id}")));
            print_response(with_api_key(request, api_key.as_deref())).await?;
        },

        Commands::Categories { url } => {
            print_response(client.get(endpoint_url(&url, "/products/categories"))).await?;
        },

        Commands::Openapi { yaml } => {
            let doc = ApiDoc::openapi();
            if yaml {
                println!("{}", doc.to_yaml()?);
            } else {
                println!("{}", doc.to_pretty_json()?);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn log_filter_verbosity_levels() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
        assert_eq!(log_filter_from_verbosity(1), "info");
        assert_eq!(log_filter_from_verbosity(2), "debug");
        assert_eq!(log_filter_from_verbosity(3), "trace");
        assert_eq!(log_filter_from_verbosity(10), "trace");
    }

    #[test]
    fn endpoint_url_concatenates_correctly() {
        assert_eq!(
            endpoint_url("http://localhost:3000", "/ready"),
            "http://localhost:3000/ready"
        );
    }

    #[test]
    fn endpoint_url_strips_trailing_slash() {
        assert_eq!(
            endpoint_url("http://example.com/", "/products"),
            "http://example.com/products"
        );
    }

    #[test]
    fn config_snippet_is_valid_toml() {
        let snippet = config_snippet("$argon2id$v=19$m=19456,t=2,p=1$abc$def", "ops");
        let value: toml::Value = toml::from_str(&snippet).unwrap();
        let entry = &value["security"]["api_keys"][0];
        assert_eq!(entry["name"].as_str(), Some("ops"));
        assert!(entry["hash"].as_str().unwrap().starts_with("$argon2id$"));
    }

    #[test]
    fn list_params_skip_missing_values() {
        let params = list_params(
            Some("active".to_string()),
            None,
            Some("vase".to_string()),
            Some(2),
            None,
            Some("price".to_string()),
            None,
        );
        assert_eq!(
            params,
            vec![
                ("status", "active".to_string()),
                ("search", "vase".to_string()),
                ("page", "2".to_string()),
                ("sortBy", "price".to_string()),
            ]
        );
    }

    #[test]
    fn parses_products_with_filters() {
        let cli = parse(&[
            "catalog-cli",
            "products",
            "--status",
            "draft",
            "--limit",
            "50",
            "--sort-by",
            "createdAt",
            "--api-key",
            "sk-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Products {
                status,
                limit,
                sort_by,
                api_key,
                url,
                ..
            } => {
                assert_eq!(status.as_deref(), Some("draft"));
                assert_eq!(limit, Some(50));
                assert_eq!(sort_by.as_deref(), Some("createdAt"));
                assert_eq!(api_key.as_deref(), Some("sk-1"));
                assert_eq!(url, "http://localhost:3000");
            },
            other => panic!("Expected Products command, got {other:?}"),
        }
    }

    #[test]
    fn parses_hash_api_key_with_default_name() {
        let cli = parse(&["catalog-cli", "hash-api-key", "sk-secret"]).unwrap();
        match cli.command {
            Commands::HashApiKey {
                api_key,
                name,
                verify,
            } => {
                assert_eq!(api_key, "sk-secret");
                assert_eq!(name, "admin");
                assert!(!verify);
            },
            other => panic!("Expected HashApiKey command, got {other:?}"),
        }
    }

    #[test]
    fn parses_product_and_custom_url() {
        let cli = parse(&["catalog-cli", "-vv", "product", "abc", "-u", "http://api:8080"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Product { ref id, ref url, .. } if id == "abc" && url == "http://api:8080"
        ));
    }

    #[test]
    fn rejects_missing_subcommand_and_bad_numbers() {
        assert!(parse(&["catalog-cli"]).is_err());
        assert!(parse(&["catalog-cli", "product"]).is_err());
        assert!(parse(&["catalog-cli", "products", "--page", "first"]).is_err());
    }
}
