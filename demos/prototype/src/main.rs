use std::sync::Arc;

use trellis_config::ConfigRegistry;
use trellis_di::{DiContainer, DynError, Registration};

use crate::modules::warehouse::{self, Warehouse, WarehouseConfig};

mod modules;

fn main() -> Result<(), DynError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut registry = ConfigRegistry::initialize();
    registry.add_config(WarehouseConfig { capacity: 100 })?;

    let container = DiContainer::new();
    container.register_module(warehouse::module(registry.config()?))?;
    // the registry itself is an ordinary component other features can resolve
    container.register(
        Registration::<ConfigRegistry>::for_contract().instance_object(Arc::new(registry)),
    )?;

    let warehouse = container.resolve::<dyn Warehouse>()?;
    warehouse.store("crate of apples".into(), 40);
    warehouse.store("crate of apples".into(), 70);

    tracing::info!(
        "apples in stock: {}",
        warehouse.stock_of("crate of apples".into())
    );
    Ok(())
}
