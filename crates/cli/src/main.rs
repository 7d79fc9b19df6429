use anyhow::Context;
use catalog_app::Catalog;
use catalog_kernel::settings::Settings;
use clap::{Parser, Subcommand};

mod shell;

#[derive(Debug, Parser)]
#[command(name = "catalog", version, about = "Product catalog server and terminal client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Interactive product list and forms on stdin/stdout
    Shell,
    /// Load and validate configuration, then print a summary
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load catalog settings")?;

    match cli.command {
        Command::Serve => {
            catalog_telemetry::init(&settings.telemetry);
            tracing::info!(env = ?settings.environment, "catalog serve starting");
            Catalog::from_settings(settings)?.serve().await
        }
        Command::Shell => {
            catalog_telemetry::init_stderr(&settings.telemetry);
            let catalog = Catalog::from_settings(settings)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell::Shell::new(&catalog, stdin, std::io::stdout())
                .run()
                .await
        }
        Command::CheckConfig => {
            println!("environment: {:?}", settings.environment);
            println!(
                "server: {}:{} (timeout {} ms)",
                settings.server.host, settings.server.port, settings.server.request_timeout_ms
            );
            println!("database: {}", settings.database.describe());
            println!(
                "tables: products={} users={}",
                settings.database.products_table, settings.database.users_table
            );
            println!(
                "telemetry: {:?} {}",
                settings.telemetry.log_format, settings.telemetry.log_level
            );
            println!("session ttl: {} min", settings.auth.session_ttl_minutes);
            Ok(())
        }
    }
}
