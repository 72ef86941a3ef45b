//! CLI entry point for feldroy-site

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feldroy_site::feed::FeedBuilder;
use feldroy_site::index::{self, TagIndex};
use feldroy_site::Site;

#[derive(Parser)]
#[command(name = "feldroy-site")]
#[command(version)]
#[command(about = "A personal markdown blog server", long_about = None)]
struct Cli {
    /// Set the site directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the site over HTTP
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5001")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// List site content
    List {
        /// Type of content to list (posts, tags, redirects)
        #[arg(default_value = "posts")]
        r#type: String,
    },

    /// Search posts from the command line
    Search {
        /// Text to look for
        query: String,
    },

    /// Build Atom and RSS feeds into the feeds directory
    Feeds,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "feldroy_site=debug,tower_http=debug,info"
    } else {
        "feldroy_site=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    match cli.command {
        Commands::Serve { port, ip } => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Serving {:?}", site.base_dir);
            feldroy_site::server::start(site, &ip, port).await?;
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            list(&site, &r#type)?;
        }

        Commands::Search { query } => {
            let site = Site::new(&base_dir)?;
            let posts = site.loader().list_posts()?;
            let results = index::search(&posts, &query);
            println!("Found {} results", results.len());
            for post in results {
                println!("  {} - {} [{}]", post.date_label(), post.title, post.slug);
            }
        }

        Commands::Feeds => {
            let site = Site::new(&base_dir)?;
            let posts = site.loader().list_posts()?;
            let written = FeedBuilder::new(&site).write_all(&posts)?;
            println!("Generated {} feeds", written.len());
        }

        Commands::Version => {
            println!("feldroy-site version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// List site content by type
fn list(site: &Site, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let posts = site.loader().list_posts()?;
            println!("Posts ({}):", posts.len());
            for post in posts {
                let marker = if post.popular { " *" } else { "" };
                println!(
                    "  {} - {} [{}]{}",
                    post.date_label(),
                    post.title,
                    post.slug,
                    marker
                );
            }
        }
        "tag" | "tags" => {
            let posts = site.loader().list_posts()?;
            let tags = TagIndex::build(&posts);
            println!("Tags ({}):", tags.len());
            for (tag, count) in tags.iter() {
                println!("  {} ({})", tag, count);
            }
        }
        "redirect" | "redirects" => {
            println!("Redirects ({}):", site.redirects.len());
            for (from, to) in site.redirects.iter() {
                println!("  {} -> {}", from, to);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: posts, tags, redirects",
                content_type
            );
        }
    }

    Ok(())
}
