//! `llmdesk onboard`: first-time setup.

use llmdesk_config::AppConfig;
use llmdesk_security::generate_key;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();

    println!("llmdesk: First-Time Setup");
    println!("=========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, onboard_toml()?)?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set GEMINI_API_KEY (and TAVILY_API_KEY for the search page)");
    println!("   2. Run: llmdesk hash-password <username> <password>");
    println!("   3. Paste the printed section into {}", config_path.display());
    println!("   4. Run: llmdesk chat --page gemini\n");

    Ok(())
}

/// Default config with a freshly generated cookie signing key.
fn onboard_toml() -> Result<String, toml::ser::Error> {
    let mut config = AppConfig::default();
    config.auth.cookie.key = generate_key();
    toml::to_string_pretty(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onboard_config_parses_and_has_key() {
        let text = onboard_toml().unwrap();
        let config: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.auth.cookie.key.len(), 64);
        assert!(config.validate().is_ok());
    }
}
