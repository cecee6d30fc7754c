//! `contextgate config` — Configuration management commands.

use contextgate_config::AppConfig;
use contextgate_fidelity::CompactionGate;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            if config.fidelity.required_saving_ratio <= 0.0 {
                println!("   ⚠️  required_saving_ratio is not positive, the default applies");
            }

            let gate = CompactionGate::from_config(&config.fidelity);
            println!();
            println!(
                "   Required saving: {:.1}%",
                gate.required_saving_ratio() * 100.0
            );
            println!("   Max attempts:    {}", gate.max_attempts());
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
