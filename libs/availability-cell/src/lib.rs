pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::reconciler::{reconcile, SlotSelection};
pub use services::slots::{generate_slots, generate_slots_for_date};
pub use services::AvailabilityService;
