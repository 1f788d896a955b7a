use std::time::Duration;
use tokio_tungstenite::connect_async;
use zenith_core::{Config, Paths};

/// Run full environment diagnostics.
pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!();
    println!("🩺 zenith doctor - environment diagnostics");
    println!("==========================================");
    println!();

    let mut ok_count = 0u32;
    let mut warn_count = 0u32;
    let mut err_count = 0u32;

    // --- 1. Config ---
    println!("📋 Configuration");
    let config_path = paths.config_file();
    if config_path.exists() {
        print_ok("Config file exists", &config_path.display().to_string());
        ok_count += 1;
    } else {
        print_warn(
            "Config file not found",
            "Using defaults. Run `zenith config init` to create one",
        );
        warn_count += 1;
    }

    let config = match Config::load_or_default(&paths) {
        Ok(config) => {
            print_ok("Config parses", "");
            ok_count += 1;
            config
        }
        Err(e) => {
            print_err("Config is invalid", &e.to_string());
            err_count += 1;
            println!();
            println!("{} ok, {} warnings, {} errors", ok_count, warn_count, err_count);
            return Ok(());
        }
    };

    println!("  Endpoint: {}", config.backend.endpoint);
    println!();

    // --- 2. Endpoint ---
    println!("🔌 Endpoint");
    match url::Url::parse(&config.backend.endpoint) {
        Ok(url) if url.scheme() == "ws" || url.scheme() == "wss" => {
            print_ok("Endpoint URL is valid", "");
            ok_count += 1;
        }
        Ok(url) => {
            print_err(
                "Endpoint scheme is not ws/wss",
                &format!("got `{}`", url.scheme()),
            );
            err_count += 1;
        }
        Err(e) => {
            print_err("Endpoint URL does not parse", &e.to_string());
            err_count += 1;
        }
    }
    println!();

    // --- 3. Backend health ---
    println!("🌐 Backend");
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()?;
    let health_url = format!("{}/health", config.backend.http_base);
    match http.get(&health_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            print_ok("Health endpoint responds", &health_url);
            ok_count += 1;
        }
        Ok(resp) => {
            print_warn(
                "Health endpoint unhealthy",
                &format!("HTTP {}", resp.status()),
            );
            warn_count += 1;
        }
        Err(e) => {
            print_err("Health endpoint unreachable", &e.to_string());
            err_count += 1;
        }
    }

    match tokio::time::timeout(
        Duration::from_secs(3),
        connect_async(config.backend.endpoint.as_str()),
    )
    .await
    {
        Ok(Ok((_ws, _))) => {
            print_ok("WebSocket handshake succeeds", &config.backend.endpoint);
            ok_count += 1;
        }
        Ok(Err(e)) => {
            print_err("WebSocket handshake failed", &e.to_string());
            err_count += 1;
        }
        Err(_) => {
            print_err("WebSocket handshake timed out", &config.backend.endpoint);
            err_count += 1;
        }
    }

    println!();
    println!("{} ok, {} warnings, {} errors", ok_count, warn_count, err_count);
    if err_count > 0 {
        println!("Start the Zenith backend, then re-run `zenith doctor`.");
    }
    Ok(())
}

fn print_ok(check: &str, detail: &str) {
    if detail.is_empty() {
        println!("  ✓ {}", check);
    } else {
        println!("  ✓ {} ({})", check, detail);
    }
}

fn print_warn(check: &str, detail: &str) {
    println!("  ! {} ({})", check, detail);
}

fn print_err(check: &str, detail: &str) {
    println!("  ✗ {} ({})", check, detail);
}
