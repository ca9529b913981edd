pub mod client;
pub mod headers;

pub use client::HttpClient;
pub use headers::random_headers;
