use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password, Select};
use pal_core::config::Config;

const BANNER: &str = r"
    -------------------------
     ___   __   _
    | _ \ /  \ | |
    |  _/| () || |__
    |_|   \__/ |____|

    -------------------------
";

const PROVIDERS: [&str; 2] = ["anthropic", "openai"];

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn models_for(provider: &str) -> &'static [&'static str] {
    match provider {
        "openai" => &["gpt-4o", "gpt-4o-mini", "gpt-4.1"],
        _ => &[
            "claude-sonnet-4-20250514",
            "claude-opus-4-20250514",
            "claude-3-5-haiku-20241022",
        ],
    }
}

fn setup_provider() -> Result<String> {
    let selection = Select::new()
        .with_prompt("Select your model provider")
        .items(&PROVIDERS)
        .default(0)
        .interact()
        .context("Failed to select provider")?;

    Ok(PROVIDERS[selection].to_string())
}

fn setup_api_key(provider: &str) -> Result<String> {
    let api_key = Password::new()
        .with_prompt(format!("Enter your {} API key", provider))
        .interact()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(anyhow::anyhow!("API key cannot be empty"));
    }

    Ok(api_key)
}

fn setup_model(provider: &str) -> Result<String> {
    let models = models_for(provider);

    let selection = Select::new()
        .with_prompt("Select your model")
        .items(models)
        .default(0)
        .interact()
        .context("Failed to select model")?;

    Ok(models[selection].to_string())
}

fn setup_working_dir() -> Result<Option<std::path::PathBuf>> {
    let dir: String = Input::new()
        .with_prompt("Directory for shell commands (blank for the current directory)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read working directory")?;

    let dir = dir.trim();
    Ok((!dir.is_empty()).then(|| std::path::PathBuf::from(dir)))
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to pal!").white().bold());
    println!(
        "  {}",
        style("This wizard writes a config file for the terminal and HTTP front ends.").dim()
    );
    println!();

    print_step(1, 4, "Provider");
    let provider = setup_provider()?;

    print_step(2, 4, "API Key Setup");
    let api_key = setup_api_key(&provider)?;

    print_step(3, 4, "Model Selection");
    let model = setup_model(&provider)?;

    print_step(4, 4, "Working Directory");
    let working_dir = setup_working_dir()?;

    let config = Config {
        provider: Some(provider),
        api_key,
        model,
        working_dir,
        ..Default::default()
    };

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(pal_core::config::get_config_path().display()).cyan()
    );
    println!();
    println!(
        "  {} You can now run: {} or {}",
        style("→").green(),
        style("pal chat").cyan().bold(),
        style("pal serve").cyan().bold()
    );
    println!();

    Ok(config)
}
