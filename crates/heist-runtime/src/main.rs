use anyhow::{Context, Result};
use heist_runtime::config::RuntimeConfig;
use heist_runtime::console::{status_line, Console, HELP};
use heist_runtime::HeistRuntime;
use heist_telemetry::{init_telemetry, TelemetryConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use vh_04_session_coordinator::SessionApi;

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env();
    config.validate().context("Invalid runtime configuration")?;

    let runtime = HeistRuntime::new(config);
    runtime.start();
    let session = runtime.create_session().await?;
    let manager = runtime.manager();
    println!("session {session}");
    println!("{}", status_line(manager.get_snapshot(session)?.as_ref()));
    println!("{HELP}");

    let mut console = Console::new(manager, session);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!(session_id = %session, "Console ready. Press Ctrl+C to stop.");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match console.handle_line(&line).await {
                    Ok(reply) => {
                        if !reply.text.is_empty() {
                            println!("{}", reply.text);
                        }
                        if reply.quit {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(session_id = %session, error = %e, "Session is no longer playable");
                        println!("{e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    runtime.shutdown().await;
    Ok(())
}
