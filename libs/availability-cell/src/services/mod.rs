pub mod time;
pub mod slots;
pub mod reconciler;
pub mod availability;

pub use availability::AvailabilityService;
