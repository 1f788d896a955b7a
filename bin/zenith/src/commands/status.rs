use std::time::Duration;
use zenith_core::{Config, Paths};

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config_path = paths.config_file();
    let config_exists = config_path.exists();

    println!("zenith status");
    println!("=============");
    println!();
    println!(
        "Config:   {} {}",
        config_path.display(),
        if config_exists {
            "✓"
        } else {
            "✗ (not found, using defaults)"
        }
    );

    let config = Config::load_or_default(&paths)?;
    println!("Backend:  {}", config.backend.endpoint);
    println!("Sidecar:  {}", config.backend.http_base);
    println!("Retry:    every {} ms", config.backend.reconnect_delay_ms);
    println!();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()?;
    let status_url = format!("{}/api/status", config.backend.http_base);

    match client.get(&status_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let snapshot: serde_json::Value = resp.json().await.unwrap_or_default();
            println!("Agent state snapshot:");
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Ok(resp) => {
            println!("Backend responded with HTTP {}", resp.status());
        }
        Err(_) => {
            println!("Backend unreachable. Run `zenith doctor` for details.");
        }
    }

    Ok(())
}
