//! Example walking through send, verify and lockout with in-memory storage
//!
//! Run with: cargo run -p pv_infra --example otp_flow_demo

use pv_core::Purpose;
use pv_infra::bootstrap::build_in_memory;
use pv_infra::telemetry::init_tracing;
use pv_shared::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Development config: dry-run SMS, lenient limits
    let mut config = AppConfig::development();
    config.otp.server_secret = "demo-secret-do-not-use".to_string();
    init_tracing(&config.logging);

    let dispatcher = build_in_memory(&config)?;
    let phone = "+15550001111";

    println!("\n=== Sending a login code ===");
    let sent = dispatcher.send(phone, Purpose::Login).await;
    println!("{}", serde_json::to_string_pretty(&sent)?);

    println!("\n=== Wrong codes until lockout ===");
    for attempt in 1..=config.otp.max_attempts {
        let response = dispatcher.verify(phone, "000000", Purpose::Login).await;
        println!(
            "Attempt {}: code={:?} message={}",
            attempt, response.code, response.message
        );
    }

    println!("\n=== Rate limit usage ===");
    let status = dispatcher.rate_limit_status(phone).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);

    dispatcher.reset_rate_limit(phone).await?;
    dispatcher.invalidate(phone, Purpose::Login).await?;
    println!("\nState cleared");

    Ok(())
}
