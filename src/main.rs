//! `canon` command-line entrypoint.
//!
//! Prints the canonical form of each query given on the command line, or of each
//! non-empty stdin line when no query is given.
//!
//! ```text
//! canon [--json] [QUERY ...]
//! ```

use mimalloc::MiMalloc;
use tokio::io::AsyncReadExt;

use canon::cache::CacheKey;
use canon::canonical::Canonicalizer;
use canon::config::Config;
use canon::named::NamedQueryRegistry;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let defaults = config.cache_options();
    tracing::info!(
        max_nesting_depth = config.max_nesting_depth,
        scoped_capacity = config.scoped_capacity,
        shared_capacity = config.shared_capacity,
        storage_mode = %defaults.storage_mode,
        ttl_secs = defaults.ttl_secs,
        "canon starting"
    );

    if config.registry_path.is_some() {
        let registry = NamedQueryRegistry::from_config(&config)?;
        tracing::info!(definitions = registry.len(), "Registry is valid");
    }

    let mut json = false;
    let mut queries = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => {
                println!("usage: canon [--json] [QUERY ...]");
                return Ok(());
            }
            _ => queries.push(arg),
        }
    }

    if queries.is_empty() {
        let mut input = String::new();
        tokio::io::stdin().read_to_string(&mut input).await?;
        queries.extend(
            input
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    let canonicalizer = Canonicalizer::with_max_depth(config.max_nesting_depth);
    let mut failures = 0usize;

    for query in &queries {
        match canonicalizer.normalize_with_path(query) {
            Ok((canonical, path)) => {
                let key = CacheKey::derive(&canonical, None, false);
                if json {
                    let line = serde_json::json!({
                        "canonical": canonical.as_str(),
                        "path": path.as_str(),
                        "key": key.storage_key(),
                    });
                    println!("{}", line);
                } else {
                    println!("{}\t{}\t{}", key.storage_key(), path, canonical);
                }
            }
            Err(e) => {
                failures += 1;
                if json {
                    println!("{}", serde_json::json!({ "error": e.to_string(), "query": query }));
                } else {
                    eprintln!("error: {}: {}", e, query);
                }
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} queries could not be normalized", failures, queries.len());
    }

    Ok(())
}
