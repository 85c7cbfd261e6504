//! CLI subcommand handlers.

use crate::ConfigAction;
use crate::ServeArgs;
use cybersoc_core::config::{SocConfig, load_config, user_config_path};
use cybersoc_core::{AppContext, Storage};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn load(config_file: Option<&Path>) -> anyhow::Result<SocConfig> {
    load_config(config_file).map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
}

/// Apply command-line flags on top of the loaded configuration.
fn apply_serve_overrides(config: &mut SocConfig, args: &ServeArgs) -> anyhow::Result<()> {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(database) = &args.database {
        config.storage.path = database.clone();
    }
    if args.no_generator {
        config.generator.enabled = false;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
}

fn banner(config: &SocConfig, addr: &std::net::SocketAddr) -> String {
    let generator = if config.generator.enabled {
        format!(
            "every {}-{} s",
            config.generator.min_interval_ms / 1000,
            config.generator.max_interval_ms / 1000
        )
    } else {
        "disabled".to_string()
    };
    format!(
        "\n  CyberSecure SOC Dashboard v{version}\n\
         \n  Dashboard:        http://{addr}\
         \n  Database:         {db}\
         \n  Threat scenarios: brute force, insider threat, data exfiltration, malware\
         \n  Log generator:    {generator}\
         \n  Charts:           threats, timeline, geographic, performance, network\n\
         \n  Press Ctrl+C to stop.\n",
        version = env!("CARGO_PKG_VERSION"),
        db = config.storage.path.display(),
    )
}

/// Run the dashboard until Ctrl+C, then stop the generator.
pub async fn handle_serve(
    args: ServeArgs,
    config_file: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut config = load(config_file)?;
    apply_serve_overrides(&mut config, &args)?;

    let ctx = AppContext::from_config(&config)?;
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    let addr = listener.local_addr()?;

    if !quiet {
        println!("{}", banner(&config, &addr));
    }

    if config.generator.enabled {
        ctx.start_generator(&config.generator);
    }

    let signal_ctx = ctx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        info!("Shutdown requested");
        signal_ctx.shutdown();
    });

    info!(%addr, "CyberSOC dashboard listening");
    cybersoc_core::gateway::serve(ctx.clone(), listener).await?;
    ctx.shutdown_and_wait().await;
    info!("CyberSOC dashboard stopped");
    Ok(())
}

/// Create the schema and optionally seed sample logs.
pub async fn handle_init_db(
    database: Option<PathBuf>,
    seed: bool,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut config = load(config_file)?;
    if let Some(database) = database {
        config.storage.path = database;
    }

    let storage = Storage::from_config(&config.storage);
    storage
        .run(move |s| {
            s.initialize()?;
            if seed { s.seed_sample_logs() } else { Ok(0) }
        })
        .await
        .map(|seeded| {
            println!("Database ready at: {}", storage.path().display());
            if seed {
                println!("Inserted {} sample log(s)", seeded);
            }
        })
        .map_err(|e| anyhow::anyhow!("Failed to initialize database: {}", e))
}

/// Handle the `config` subcommands.
pub fn handle_config(action: ConfigAction, config_file: Option<&Path>) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = match config_file {
                Some(path) => path.to_path_buf(),
                None => user_config_path()
                    .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
            };
            write_default_config(&config_path)
        }
        ConfigAction::Show => {
            let config = load(config_file)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

fn write_default_config(config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() {
        println!(
            "Configuration file already exists at: {}",
            config_path.display()
        );
        return Ok(());
    }
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(&SocConfig::default())?;
    std::fs::write(config_path, &toml_str)?;
    println!(
        "Created default configuration at: {}",
        config_path.display()
    );
    Ok(())
}
