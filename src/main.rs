use std::{
    error::Error,
    io::{BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use teamreg::{
    admin::login::hash_password,
    config::{Settings, create_app, make_pool, run_migrations},
    site_config::{ConfigType, set_config},
};
use tracing::Level;

#[derive(Parser)]
#[command(name = "teamreg", about = "Team registration server")]
struct Cli {
    /// Settings file (defaults to `teamreg.toml` when it exists).
    #[arg(long, short)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server (the default).
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Insert or update a runtime configuration entry, e.g. the deadline.
    SetConfig {
        key: String,
        value: String,
        #[arg(long = "type", default_value = "str")]
        kind: ConfigType,
        #[arg(long)]
        description: Option<String>,
    },
    /// Print the argon2 hash of a password for `admin_password_hash`.
    HashPassword {
        /// Read from standard input when omitted.
        password: Option<String>,
    },
}

fn init_tracing(level: &str) {
    let parsed = level.parse::<Level>().ok();
    tracing_subscriber::fmt()
        .with_max_level(parsed.unwrap_or(Level::INFO))
        .init();
    if parsed.is_none() {
        tracing::warn!("unknown log level `{level}`, using info");
    }
}

async fn run(
    command: Command,
    settings: Settings,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Serve => {
            let pool = make_pool(&settings.database_url)?;
            run_migrations(&pool)?;

            if settings.admin_password_hash.is_none() {
                tracing::warn!(
                    "no admin_password_hash set, admin login is disabled"
                );
            }

            let listener =
                tokio::net::TcpListener::bind(&settings.bind_address).await?;
            tracing::info!(
                "listening on {} (database {})",
                settings.bind_address,
                settings.database_url
            );

            axum::serve(listener, create_app(pool, settings))
                .with_graceful_shutdown(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("could not listen for ctrl-c: {e}");
                    }
                })
                .await?;
        }
        Command::Migrate => {
            let pool = make_pool(&settings.database_url)?;
            run_migrations(&pool)?;
        }
        Command::SetConfig {
            key,
            value,
            kind,
            description,
        } => {
            let pool = make_pool(&settings.database_url)?;
            run_migrations(&pool)?;
            let mut conn = pool.get()?;
            set_config(
                &key,
                &value,
                kind,
                description.as_deref(),
                &mut *conn,
            )?;
            println!("{key} = {value} ({})", kind.as_str());
        }
        Command::HashPassword { password } => {
            let password = match password {
                Some(password) => password,
                None => {
                    eprint!("password: ");
                    std::io::stderr().flush()?;
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)?;
                    line.trim_end_matches(['\r', '\n']).to_string()
                }
            };
            let hash = hash_password(&password).map_err(|e| e.to_string())?;
            println!("{hash}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("teamreg: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings.log_level);

    match run(cli.command.unwrap_or(Command::Serve), settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("teamreg: {e}");
            ExitCode::FAILURE
        }
    }
}
