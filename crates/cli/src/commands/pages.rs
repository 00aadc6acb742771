//! `llmdesk pages`: list the chat pages.

use llmdesk_config::AppConfig;
use llmdesk_pipeline::PageProfile;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Pages");
    println!("=====");
    for profile in PageProfile::all(&config) {
        println!();
        println!("  {} ({})", profile.title, profile.kind);
        for (i, model) in profile.models.iter().enumerate() {
            let marker = if *model == profile.default_model { "*" } else { " " };
            println!("    {marker} [{i}] {model}");
        }
        let budget = if profile.token_budget == 0 {
            "unbounded".to_string()
        } else {
            format!("{} tokens", profile.token_budget)
        };
        println!("    memory:      {budget}");
        if let Some(n) = profile.max_results {
            println!("    max results: {n}");
        }
        if let (Some(size), Some(overlap)) = (profile.chunk_size, profile.chunk_overlap) {
            println!("    chunks:      {size} chars, {overlap} overlap");
        }
    }

    Ok(())
}
