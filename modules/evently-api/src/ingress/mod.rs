//! Transport adapters that turn inbound requests into `ApiRequest`s.

pub mod http;
pub mod proxy;

pub use self::http::router;
pub use proxy::{handle_event, ProxyEvent, ProxyResponse};
