//! lidcordion: serve the lid-angle stream, or render a scripted performance.

use std::future::IntoFuture;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use lidcordion::config::Config;
use lidcordion::dsp::renderer::{Performance, render_wav};
use lidcordion::error::LidcordionError;
use lidcordion::relay::{SensorHub, router};

#[derive(Parser)]
#[command(name = "lidcordion", version)]
#[command(about = "Laptop-lid accordion: sensor relay and offline renderer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the sensor process and serve its samples as server-sent events
    Serve {
        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to listen on (overrides the config)
        #[arg(short, long)]
        bind: Option<String>,

        /// Sensor executable (overrides the config)
        #[arg(short, long)]
        sensor: Option<PathBuf>,
    },

    /// Render a JSON performance script to a WAV file
    Render {
        /// Performance script
        script: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        out: PathBuf,

        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config, LidcordionError> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            sensor,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(sensor) = sensor {
                config.sensor.command = sensor;
            }

            let hub = SensorHub::spawn(&config.sensor, config.server.channel_capacity);
            let app = router(hub, &config.server.route);
            let listener = TcpListener::bind(&config.server.bind).await?;
            info!(
                "Serving lid angle on http://{}{}",
                listener.local_addr()?,
                config.server.route
            );

            // Event streams never finish on their own, so shutdown does not
            // wait for open connections.
            tokio::select! {
                result = axum::serve(listener, app).into_future() => result?,
                _ = tokio::signal::ctrl_c() => info!("Shutting down"),
            }
        }

        Commands::Render {
            script,
            out,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let text = std::fs::read_to_string(&script)?;
            let performance: Performance = serde_json::from_str(&text)?;
            info!(
                "Rendering {} events ({:.2}s) from {}",
                performance.events.len(),
                performance.duration(),
                script.display()
            );

            let wav = render_wav(&performance, &config.synth).map_err(LidcordionError::from)?;
            std::fs::write(&out, &wav)?;
            info!("Wrote {} bytes to {}", wav.len(), out.display());
        }
    }

    Ok(())
}
