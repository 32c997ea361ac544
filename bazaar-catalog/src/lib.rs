pub mod product;
pub mod repository;
pub mod inventory;
pub mod memory;

pub use product::{NewProduct, Product, ProductFilter, ProductUpdate, StockLevel, StockSnapshot};
pub use repository::{ProductRepository, StockPolicy};
pub use inventory::{LedgerSettings, StockLedger};
pub use memory::InMemoryProductRepository;
