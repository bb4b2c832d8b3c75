pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::booking::AppointmentBookingService;
pub use services::lifecycle::AppointmentLifecycleService;
pub use services::session::{BookingSession, FetchKind, FetchTicket};
