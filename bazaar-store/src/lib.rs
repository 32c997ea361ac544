pub mod app_config;
pub mod database;
pub mod redis_repo;
pub mod product_repo;
pub mod order_repo;
pub mod credit_repo;

pub use app_config::{Config, StorageBackend};
pub use database::DbClient;
pub use redis_repo::RedisClient;
pub use product_repo::StoreProductRepository;
pub use order_repo::StoreOrderRepository;
pub use credit_repo::StoreCreditRepository;
