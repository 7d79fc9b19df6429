pub mod auth;
pub mod products;
pub mod web;

use catalog_kernel::ModuleRegistry;

use crate::bootstrap::Catalog;

/// Register every module the catalog serves
pub fn register_all(registry: &mut ModuleRegistry, catalog: &Catalog) {
    registry.register_core(auth::create_module(catalog.auth.clone()));
    registry.register_custom(products::create_module(
        catalog.products.clone(),
        catalog.auth.clone(),
    ));
    registry.register_custom(web::create_module(products::ProductsState {
        service: catalog.products.clone(),
        auth: catalog.auth.clone(),
    }));
}
