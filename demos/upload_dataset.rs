use dashcore::{
    apis::{fetch_all_datasets, fetch_system_health, fetch_trading_mode, Backend, Mock},
    prompts::seed_templates,
    Dashboard, Principal, Session, Settings, UserProfile,
};
use chrono::Utc;
use serde_json::json;
use std::{env, fs};

// Uploads a CSV or JSON candle file into an in-memory backend and prints what was stored.
// Usage: cargo run --example upload_dataset -- path/to/candles.csv
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    simple_logger::SimpleLogger::new().init()?;

    let path = env::args()
        .nth(1)
        .ok_or("expected the path of a .csv or .json file")?;
    let content = fs::read(&path)?;

    let principal = Principal::new("2vxsx-fae");
    let dashboard = Dashboard::new(Settings::from_env(), Session::authenticated(principal));
    let mock = Mock::new(principal);
    // The deployed actor reports maintenance with a tagged string.
    mock.set_health(json!("#maintenance"), None).await;
    let backend = dashboard.connect(mock);

    backend
        .save_caller_user_profile(UserProfile::new("Demo", "", 0))
        .await?;
    seed_templates(&backend, Utc::now()).await?;

    let health = fetch_system_health(&backend).await?;
    println!("{}: {}", health.status.title(), health.display_message());
    println!("Mode: {}", fetch_trading_mode(&backend).await?.label());

    let id = dashboard
        .upload_dataset_file(&backend, &path, &content, "Demo dataset", "")
        .await?;
    let summary = backend.get_candle_summary(&id).await?;
    println!(
        "{}: {} candles, average close {:.4}, total volume {:.2}",
        id, summary.total_count, summary.avg_price, summary.total_volume
    );
    println!("{} dataset(s) stored.", fetch_all_datasets(&backend).await?.len());

    Ok(())
}
