pub mod hybrid;
pub mod item_based;
pub mod scheduler;
pub mod user_based;

pub use hybrid::HybridRecommender;
pub use item_based::ItemBasedCf;
pub use scheduler::MaintenanceScheduler;
pub use user_based::UserBasedCf;
