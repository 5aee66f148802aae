use anyhow::Result;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::time::Instant;
use tracing::info;

use agro_indices::db::{create_pool, PgSensorSource};
use agro_indices::{Config, FarmId, IndexEngine, RawIndexQuery};

#[derive(Parser, Debug)]
#[command(name = "agro_indices")]
#[command(about = "Chill hours and growing degree days from farm sensor tables", long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chill hours / units for the dormancy campaign
    Chill {
        #[command(flatten)]
        common: CommonArgs,

        /// Chill model: fixed, delta or utah
        #[arg(long)]
        mode: Option<String>,

        /// Assumed minutes per reading (fixed and utah)
        #[arg(long)]
        sample_minutes: Option<String>,

        /// Cap on credited time per reading (delta)
        #[arg(long)]
        max_gap_minutes: Option<String>,

        /// Keep negative Utah days instead of clamping to zero
        #[arg(long)]
        allow_negative: Option<String>,
    },
    /// Growing degree days for the growing campaign
    Gdd {
        #[command(flatten)]
        common: CommonArgs,

        /// Base temperature in °C
        #[arg(long)]
        base_temp: Option<String>,

        /// Full-bloom date that starts accumulation (YYYY-MM-DD)
        #[arg(long)]
        bloom_date: Option<String>,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Farm identifier
    #[arg(long)]
    farm: String,

    /// Campaign reference year
    #[arg(long)]
    year: Option<String>,

    /// Restrict to one sensor
    #[arg(long)]
    sensor: Option<String>,

    /// campaign or custom
    #[arg(long)]
    range: Option<String>,

    /// Custom range start (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,

    /// Custom range end (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,
}

impl CommonArgs {
    fn query(&self) -> RawIndexQuery {
        RawIndexQuery {
            year: self.year.clone(),
            sensor: self.sensor.clone(),
            range: self.range.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            ..RawIndexQuery::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agro_indices=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let today = Local::now().date_naive();
    let pool = create_pool(&config).await?;
    let engine = IndexEngine::new(PgSensorSource::new(pool), config);
    let started = Instant::now();

    let output = match cli.command {
        Command::Chill {
            common,
            mode,
            sample_minutes,
            max_gap_minutes,
            allow_negative,
        } => {
            let farm = FarmId::parse(&common.farm)?;
            let query = RawIndexQuery {
                mode,
                sample_minutes,
                max_gap_minutes,
                allow_negative,
                ..common.query()
            };
            let request = query.chill_request(engine.config(), today)?;
            let report = engine.chill(&farm, &request, today).await?;
            serde_json::to_string_pretty(&report)?
        }
        Command::Gdd {
            common,
            base_temp,
            bloom_date,
        } => {
            let farm = FarmId::parse(&common.farm)?;
            let query = RawIndexQuery {
                base_temp,
                bloom_date,
                ..common.query()
            };
            let request = query.gdd_request(engine.config(), today)?;
            let response = engine.gdd(&farm, &request, today).await?;
            serde_json::to_string_pretty(&response)?
        }
    };

    info!("Computed in {:.2} seconds", started.elapsed().as_secs_f32());
    println!("{}", output);
    Ok(())
}
