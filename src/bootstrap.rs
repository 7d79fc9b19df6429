//! Composition root: builds the store, auth provider and product service once
//! and hands them to the modules, the server and the interactive shell.

use std::sync::Arc;

use anyhow::Context;
use catalog_authz::{AuthContext, StoreAuthProvider, TokenConfig};
use catalog_http::AuthHandle;
use catalog_kernel::settings::Settings;
use catalog_kernel::{InitCtx, ModuleRegistry};

use crate::modules::{self, products::ProductService};

pub struct Catalog {
    pub settings: Settings,
    pub auth: AuthHandle,
    pub products: Arc<ProductService>,
}

impl Catalog {
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let store = catalog_db::connect(&settings.database)
            .with_context(|| format!("failed to connect to {}", settings.database.describe()))?;

        let tokens = TokenConfig {
            secret: settings.auth.jwt_secret.clone(),
            ttl: chrono::Duration::minutes(settings.auth.session_ttl_minutes),
        };
        let provider =
            StoreAuthProvider::new(store.clone(), settings.database.users_table.clone(), tokens);
        let products = ProductService::new(store, settings.database.products_table.clone());

        Ok(Self {
            settings,
            auth: AuthHandle(Arc::new(provider)),
            products: Arc::new(products),
        })
    }

    /// A fresh signed-out session holder sharing this catalog's provider.
    pub fn auth_context(&self) -> AuthContext {
        AuthContext::new(self.auth.0.clone())
    }

    pub fn registry(&self) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, self);
        registry
    }

    /// Run the module lifecycle around the HTTP server.
    pub async fn serve(&self) -> anyhow::Result<()> {
        let registry = self.registry();
        let ctx = InitCtx {
            settings: &self.settings,
        };

        registry.init_all(&ctx).await?;
        registry.start_all(&ctx).await?;
        tracing::info!(
            core = registry.core_module_count(),
            custom = registry.custom_module_count(),
            "modules started"
        );

        let served = catalog_http::start_server(&registry, &self.settings).await;
        registry.stop_all().await?;
        served
    }
}
