pub mod http;
pub use http::{client_from_config, create_http_client};
