//! Business services for the application layer.

pub mod description_service;
pub mod offering_service;
pub mod store_service;
pub mod user_service;

mod transaction;

pub use description_service::DescriptionService;
pub use offering_service::OfferingService;
pub use store_service::StoreService;
pub use user_service::UserService;
