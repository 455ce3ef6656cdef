use anyhow::{Result, bail};
use audiosplit_core::Settings;

use crate::app;
use crate::args::ConfigArgs;

pub fn run(args: ConfigArgs) -> Result<()> {
    let mut settings = if args.reset {
        Settings::default()
    } else {
        Settings::load()
    };

    let changed = apply(&mut settings, &args)? || args.reset;

    if changed {
        tracing::debug!("Saving settings: {settings:?}");
        settings.save()?;
        match Settings::path() {
            Some(path) => app::success(&format!("Settings saved to {}", path.display())),
            None => app::success("Settings saved"),
        }
    }

    if args.show || !changed {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    }

    Ok(())
}

/// Apply flag overrides, returning whether anything changed.
fn apply(settings: &mut Settings, args: &ConfigArgs) -> Result<bool> {
    let mut changed = false;

    if let Some(dir) = &args.output_dir {
        settings.output_dir = dir.clone();
        changed = true;
    }
    if let Some(minutes) = args.max_duration {
        if minutes == 0 {
            bail!("--max-duration must be at least 1 minute");
        }
        settings.max_duration_minutes = minutes;
        changed = true;
    }
    if let Some(mb) = args.max_size {
        if !(mb.is_finite() && mb > 0.0) {
            bail!("--max-size must be a positive number of MB");
        }
        settings.max_size_mb = mb;
        changed = true;
    }
    if let Some(policy) = args.shrink_policy {
        settings.shrink_policy = policy;
        changed = true;
    }
    if let Some(bitrate) = &args.bitrate {
        settings.bitrate = bitrate.clone();
        changed = true;
    }

    Ok(changed)
}
