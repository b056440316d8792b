//! Texture upload verification binary
//!
//! Runs every upload scenario on a headless device and reports which ones read back the
//! expected pixels. Exits with an error when any scenario fails.

use texture_set_verification::compare::CompareResult;
use texture_set_verification::scenarios::{self, Harness};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let harness = Harness::new().await?;
    let textures = harness.textures();
    tracing::info!("Limits: {:?}", textures.limits());
    tracing::info!("Formats: {}", textures.supported_formats().join(", "));

    let mut failures = 0;
    for (name, scenario) in scenarios::all() {
        match scenario(&harness) {
            Ok(CompareResult::Match) => println!("✓ {name}"),
            Ok(CompareResult::DimensionMismatch { expected, actual }) => {
                eprintln!("✗ {name}: expected {expected:?}, read back {actual:?}");
                failures += 1;
            }
            Ok(CompareResult::PixelMismatch { first, count, max_difference }) => {
                eprintln!("✗ {name}: {count} pixels differ, first at {first:?}, max difference {max_difference}");
                failures += 1;
            }
            Err(e) => {
                eprintln!("✗ {name}: {e}");
                failures += 1;
            }
        }
    }

    let stats = textures.stats().snapshot();
    tracing::info!("Remaining textures: {stats:?}, pools: {:?}", textures.pool_stats());

    if failures > 0 {
        return Err(format!("{failures} scenario(s) failed").into());
    }
    Ok(())
}
