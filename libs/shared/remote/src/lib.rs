pub mod error;
pub mod hospital_api;

pub use error::RemoteError;
pub use hospital_api::HospitalApiClient;
