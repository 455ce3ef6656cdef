//! Default command: split one file into chunks.

use anyhow::{Context, Result, bail};
use audiosplit_core::audio::create_encoder;
use audiosplit_core::config::base_name_for;
use audiosplit_core::{CancelToken, Chunker, Settings, ShrinkPolicy, SplitConfig};
use std::path::Path;

use crate::app;
use crate::args::SplitArgs;

pub async fn run(args: SplitArgs) -> Result<()> {
    let Some(input) = args.input.clone() else {
        bail!("No input file given. Usage: audiosplit <INPUT> [OPTIONS]");
    };
    if !input.exists() {
        bail!("Input file '{}' does not exist.", input.display());
    }

    app::ensure_ffmpeg_installed()?;

    let settings = Settings::load();
    let config = build_config(&settings, &args, &input);
    let bitrate = args.bitrate.as_deref().unwrap_or(&settings.bitrate);
    let quiet = args.quiet;
    tracing::debug!(
        "Resolved split config: {} min max, {} bytes max, policy {}, bitrate {}, output {}",
        config.max_duration_ms / 60_000,
        config.max_size_bytes,
        config.shrink_policy,
        bitrate,
        config.output_dir.display()
    );

    if !quiet {
        app::header(&format!("Splitting {}", input.display()));
    }

    let cancel = CancelToken::new();
    let chunker = Chunker::new(create_encoder(bitrate))
        .with_cancel_token(cancel.clone())
        .with_progress(move |output, done| {
            tracing::debug!("Chunk {} written ({done} done so far)", output.path.display());
            if quiet {
                return;
            }
            let shrunk = if output.shrink_count > 0 {
                " (shrunk)"
            } else {
                ""
            };
            app::success(&format!(
                "[{done}] part {:03}: {:.2}-{:.2} min, {:.2} MB{}",
                output.index,
                output.window.start_ms as f64 / 60_000.0,
                output.window.end_ms as f64 / 60_000.0,
                output.size_mb(),
                shrunk
            ));
        });

    let output_dir = config.output_dir.clone();
    let input_display = input.display().to_string();
    let mut task = tokio::task::spawn_blocking(move || chunker.split(&input, &config));

    let result = tokio::select! {
        res = &mut task => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, cancelling split of {}", input_display);
            app::warn("Interrupted, stopping after the current chunk...");
            cancel.cancel();
            task.await
        }
    }
    .context("Splitting task panicked")?;

    let outputs = result.context("Failed to split audio")?;
    tracing::info!("Wrote {} chunks to {}", outputs.len(), output_dir.display());

    if !quiet {
        println!(
            "Audio splitting complete. {} chunks created in {}",
            outputs.len(),
            output_dir.display()
        );
    }

    Ok(())
}

/// Merge saved settings with command-line overrides.
fn build_config(settings: &Settings, args: &SplitArgs, input: &Path) -> SplitConfig {
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| settings.output_dir.clone());
    let max_duration = args.max_duration.unwrap_or(settings.max_duration_minutes);
    let max_size = args.max_size.unwrap_or(settings.max_size_mb);
    let policy = if args.converge {
        ShrinkPolicy::Converge
    } else {
        settings.shrink_policy
    };

    SplitConfig::from_limits(output_dir, base_name_for(input), max_duration, max_size)
        .with_shrink_policy(policy)
}
