use std::{collections::HashMap, sync::Mutex};

use trellis_config::Config;
use trellis_di::{proxy_contract, Constructor, ModuleInfo, Registration};

use crate::modules::audit::AuditInterceptor;

#[derive(Clone)]
pub struct WarehouseConfig {
    pub capacity: u32,
}

proxy_contract! {
    pub trait Warehouse => WarehouseProxy {
        fn store(&self, article: String, quantity: u32) -> bool;
        fn stock_of(&self, article: String) -> u32;
    }
}

/// In-memory warehouse with a per-article capacity limit
pub struct BinStore {
    capacity: u32,
    bins: Mutex<HashMap<String, u32>>,
}

impl BinStore {
    pub fn new(capacity: u32) -> Self {
        BinStore {
            capacity,
            bins: Mutex::new(HashMap::new()),
        }
    }
}

impl Warehouse for BinStore {
    fn store(&self, article: String, quantity: u32) -> bool {
        let mut bins = self.bins.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let stocked = bins.entry(article).or_insert(0);
        if *stocked + quantity > self.capacity {
            return false;
        }
        *stocked += quantity;
        true
    }

    fn stock_of(&self, article: String) -> u32 {
        let bins = self.bins.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        bins.get(&article).copied().unwrap_or(0)
    }
}

/// All registrations of the warehouse feature, configured from the registry
pub fn module(config: Config<WarehouseConfig>) -> ModuleInfo {
    ModuleInfo::new().register(
        Registration::<dyn Warehouse>::for_contract()
            .implemented_by::<BinStore>(|store| store as std::sync::Arc<dyn Warehouse>)
            .constructor(Constructor::nullary(move || BinStore::new(config.capacity)))
            .singleton()
            .interceptor::<AuditInterceptor>(),
    )
}
