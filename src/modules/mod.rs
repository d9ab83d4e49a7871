pub mod books;

use std::sync::Arc;

use catalog_authz::RequiredClaim;
use catalog_db::BookGateway;
use catalog_kernel::ModuleRegistry;

/// Register all application modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    gateway: Arc<dyn BookGateway>,
    admin: RequiredClaim,
) -> anyhow::Result<()> {
    registry.register(books::create_module(gateway, admin))
}
