use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, Config};
use crate::scoring::ScoringRules;

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Print text with a typewriter effect, one character at a time.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;
    for c in text.chars() {
        print!("{}", c);
        std::io::stdout().flush().ok();
        thread::sleep(Duration::from_millis(18));
    }
    println!();
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    typewriter("FRC Scout Configuration Wizard");
    println!("==============================");
    println!();

    // 1. Backend
    typewriter("frc-scout reads team and match data from your scouting server.");
    let url = loop {
        let input = prompt_with_default("Scouting server URL", "http://localhost:5000")?;
        if input.starts_with("http://") || input.starts_with("https://") {
            break input;
        }
        println!("  Invalid: the URL must start with http:// or https://. Try again.");
    };
    let mut config = Config::new(&url);

    // 2. Our team
    println!();
    typewriter("Your team number is used as the default when asking for alliance recommendations.");
    config.team_number = loop {
        let input = prompt_with_default("Your team number (blank to skip)", "none")?;
        if input == "none" || input.is_empty() {
            break None;
        }
        match input.parse::<u32>() {
            Ok(n) if (1..=9999).contains(&n) => break Some(n),
            _ => println!("  Invalid: team numbers are 1 to 9999. Try again."),
        }
    };

    // 3. Sync interval
    println!();
    typewriter("`frc-scout alliance sync` polls the server for alliance selection changes.");
    config.sync_interval = loop {
        let input = prompt_with_default("Sync interval", &config.sync_interval)?;
        match humantime::parse_duration(&input) {
            Ok(d) if !d.is_zero() => break input,
            Ok(_) => println!("  Invalid: must be greater than zero. Try again."),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    // 4. Scoring
    println!();
    typewriter("Scores are computed from per-metric point values (Reefscape 2025 by default).");
    typewriter("If your server publishes scoring rules in its game config, those are used instead.");
    if prompt_yes_no("Write the default scoring table into the config so you can edit it?", false)? {
        config.scoring = Some(ScoringRules::default());
    }

    // 5. Config path
    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    // Check if file already exists
    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 6. Write config
    let yaml = serde_saphyr::to_string(&config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(&config_path, &yaml)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!();
    println!("Config written to {}", config_path.display());
    typewriter("Column aliases and fetch concurrency can also be set in the config file.");
    println!("Run `frc-scout rankings` to get started.");

    Ok(())
}
