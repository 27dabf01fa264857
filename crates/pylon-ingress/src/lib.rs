pub mod events;
pub mod registration;

pub use events::HttpEventSink;
pub use registration::HttpRegistrationClient;
