// Rolloff Directory - Sitemap CLI
// One-shot generation of the city sitemap XML from the hosted catalog

use anyhow::{Context, Result};
use chrono::Utc;
use rolloff_directory::{city_sitemap_xml, AppConfig, CatalogStore};
use std::env;
use std::fs;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("generate") => run_generate(&args[2..]).await,
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Rolloff Directory v{}", rolloff_directory::VERSION);
    println!();
    println!("Usage:");
    println!("  rolloff-directory generate [--bounded N] [OUTPUT]");
    println!();
    println!("Writes the city sitemap XML to OUTPUT (default cities-sitemap.xml,");
    println!("\"-\" for stdout). --bounded N issues a single capped read instead");
    println!("of paginating the full catalog.");
}

async fn run_generate(args: &[String]) -> Result<()> {
    println!("🗺️  Sitemap Generation - Supabase catalog → sitemap XML");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (bound, output) = parse_args(args)?;

    let config = AppConfig::from_env();
    let catalog = CatalogStore::new(&config)?;

    println!("\n📂 Fetching city catalog...");
    let cities = match bound {
        Some(cap) => catalog.fetch_cities_bounded(cap).await?,
        None => catalog.fetch_cities().await?,
    };
    println!("✓ Fetched {} cities", cities.len());

    let xml = city_sitemap_xml(&config.site_origin, Utc::now().date_naive(), &cities);

    if output == "-" {
        print!("{xml}");
    } else {
        fs::write(&output, &xml).with_context(|| format!("Failed to write {output}"))?;
        println!("✓ Wrote {} entries to {}", cities.len(), output);
    }

    Ok(())
}

/// Parse `[--bounded N] [OUTPUT]` in either order of appearance.
fn parse_args(args: &[String]) -> Result<(Option<usize>, String)> {
    let mut bound = None;
    let mut output = "cities-sitemap.xml".to_string();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--bounded" {
            let value = iter
                .next()
                .context("--bounded requires a row cap argument")?;
            bound = Some(
                value
                    .parse()
                    .with_context(|| format!("Invalid row cap: {value}"))?,
            );
        } else {
            output = arg.clone();
        }
    }

    Ok((bound, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_defaults() {
        let (bound, output) = parse_args(&[]).unwrap();
        assert_eq!(bound, None);
        assert_eq!(output, "cities-sitemap.xml");
    }

    #[test]
    fn test_parse_args_bounded_and_output() {
        let args = vec![
            "--bounded".to_string(),
            "250".to_string(),
            "out.xml".to_string(),
        ];
        let (bound, output) = parse_args(&args).unwrap();

        assert_eq!(bound, Some(250));
        assert_eq!(output, "out.xml");
    }

    #[test]
    fn test_parse_args_rejects_bad_cap() {
        let args = vec!["--bounded".to_string(), "many".to_string()];
        assert!(parse_args(&args).is_err());
    }
}
