pub mod builder;
pub mod config;
pub mod error;
pub mod fetch;
pub mod params;
pub mod parser;
pub mod response;

pub use builder::RequestBuilder;
pub use config::{ClientOptions, DEFAULT_TIMEOUT, RequestOptions};
pub use error::{Error, Result};
pub use response::ResponseHead;
