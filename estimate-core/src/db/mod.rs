pub mod factory;
pub mod memory;
pub mod repository;

pub use factory::{StoreConfig, StoreFactory, StoreRegistry};
pub use memory::{MemorySheetStore, MemoryStoreFactory};
pub use repository::{SheetStore, StoreError};
