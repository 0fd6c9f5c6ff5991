//! rasterfuse CLI - PCA fusion of co-registered rasters

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rasterfuse_core::io::{read_multiband_geotiff, write_multiband_geotiff, GeoTiffOptions};
use rasterfuse_core::MultiBandRaster;
use rasterfuse_fusion::{fuse_with_progress, FusionParams, FusionResult, TracingProgress};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rasterfuse")]
#[command(author, version, about = "PCA fusion of co-registered multi-band rasters", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Fuse two rasters into principal components
    Fuse {
        /// First input (e.g. optical)
        x: PathBuf,
        /// Second input (e.g. radar)
        y: PathBuf,
        /// Output GeoTIFF, one page per component
        output: PathBuf,
        /// Decompose the covariance matrix instead of the correlation matrix
        #[arg(long)]
        no_standardize: bool,
        /// Exclude pixels missing any band
        #[arg(long)]
        drop_incomplete: bool,
        /// Write variance and band statistics as JSON
        #[arg(long)]
        stats: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &Path) -> Result<MultiBandRaster> {
    let pb = spinner("Reading raster...");
    let raster = read_multiband_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    let (rows, cols) = raster.shape();
    info!("Input: {} x {}, {} band(s)", cols, rows, raster.band_count());
    Ok(raster)
}

fn write_components(raster: &MultiBandRaster, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_multiband_geotiff(raster, path, Some(GeoTiffOptions::default()))
        .context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn write_stats(result: &FusionResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&result.summary())
        .context("Failed to serialize statistics")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write statistics {}", path.display()))?;
    Ok(())
}

fn report(result: &FusionResult) {
    print!("{}", format_report(result));
}

/// Variance table per component, then how each band loads on PC1
fn format_report(result: &FusionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:>14} {:>10} {:>10}", "", "variance", "prop", "cum");
    for (i, name) in result.component_names.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<6} {:>14.6} {:>10.4} {:>10.4}",
            name, result.variance[i], result.proportion[i], result.cumulative[i]
        );
    }

    if let Some(first) = result.component_names.first() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<16} {:>12} {:>14}", first, "correlation", "contribution %");
        for (j, band) in result.band_names.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:<16} {:>12.4} {:>14.2}",
                band,
                result.correlation[[j, 0]],
                result.contribution[[j, 0]]
            );
        }
    }
    out
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            println!("File: {}", input.display());
            println!("  Size: {} x {} ({} cells)", cols, rows, raster.pixel_count());
            println!("  Bands: {}", raster.band_names().join(", "));
            println!("  Extent: {}", raster.extent());
            match raster.crs() {
                Some(crs) => println!("  CRS: {}", crs),
                None => println!("  CRS: none"),
            }
            match raster.nodata() {
                Some(v) => println!("  No-data: {}", v),
                None => println!("  No-data: NaN only"),
            }
        }

        Commands::Fuse {
            x,
            y,
            output,
            no_standardize,
            drop_incomplete,
            stats,
        } => {
            let x = read_raster(&x)?;
            let y = read_raster(&y)?;
            let params = FusionParams {
                standardize: !no_standardize,
                drop_incomplete,
                verbose: true,
            };

            let start = Instant::now();
            let result = fuse_with_progress(&x, &y, params, &TracingProgress)
                .context("Failed to fuse rasters")?;
            let elapsed = start.elapsed();

            write_components(&result.components, &output)?;
            if let Some(path) = stats {
                write_stats(&result, &path)?;
                info!("Statistics saved to: {}", path.display());
            }

            report(&result);
            println!("Components saved to: {}", output.display());
            println!("  Analyzed pixels: {}", result.analyzed_pixels);
            println!("  Processing time: {:.2?}", elapsed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterfuse_core::Raster;
    use rasterfuse_fusion::fuse;

    fn single(values: Vec<f64>) -> MultiBandRaster {
        Raster::from_vec(values, 2, 3)
            .unwrap()
            .into_multiband("a")
            .unwrap()
    }

    #[test]
    fn test_report_lists_pc1_loadings() {
        let x = single(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let y = single(vec![2.0, 1.0, 4.0, 3.0, 6.0, 5.0]);
        let result = fuse(&x, &y, FusionParams::default()).unwrap();

        let text = format_report(&result);
        assert!(text.contains("PC2"));
        assert!(text.contains("contribution %"));
        let rows: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("x_a") || l.starts_with("y_a"))
            .collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|l| l.trim_end().ends_with("50.00")), "{}", text);
    }
}
