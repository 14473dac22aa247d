mod client;
mod deadline;
mod response;

pub use client::{HttpClient, HttpTransport};
pub use deadline::RequestDeadline;
