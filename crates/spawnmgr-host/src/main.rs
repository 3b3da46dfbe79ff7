mod config;
mod console;
mod permissions;
mod plugin_manager;
mod world;

use std::time::Duration;

use config::HostConfig;
use console::{Console, Host};
use spawnmgr::SpawnManager;
use tokio::io::AsyncBufReadExt;
use tracing::info;

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

#[tokio::main]
async fn main() {
    let config = match HostConfig::load_or_default("server.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load server.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "{} v{} starting (plugins: {}, tick: {}ms)",
        config.server.name,
        env!("CARGO_PKG_VERSION"),
        config.server.plugins_dir.display(),
        config.server.tick_ms
    );

    let mut host = Host::new(&config);
    host.plugins.register(Box::new(SpawnManager::new()));
    print_lines(&host.start());
    info!("Ready. Type help for a list of commands.");

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let console = Console::new();
    let mut tick_interval =
        tokio::time::interval(Duration::from_millis(config.server.tick_ms.max(1)));
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                print_lines(&host.tick());
            }
            Some(line) = console_rx.recv() => {
                let result = console.handle_line(&mut host, &line);
                print_lines(&result.messages);
                if result.should_stop {
                    break;
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Saving before shutdown...");
    print_lines(&host.shutdown());
    info!("Host shut down.");
}
