use anyhow::Context;
use catalog_app::Catalog;
use catalog_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.describe(),
        "catalog-app bootstrap starting"
    );

    Catalog::from_settings(settings)?.serve().await
}
