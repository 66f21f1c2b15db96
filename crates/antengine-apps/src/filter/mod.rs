//! Eligibility predicates: URI patterns and GET/POST request filters.

pub mod request;
pub mod uri;

pub use request::RequestFilter;
pub use uri::UriRegistry;
