pub mod config;
pub mod flush;
pub mod metric;
pub mod parser;
pub mod server;
pub mod sink;
pub mod store;

pub use config::Config;
pub use metric::{MetricEvent, MetricPayload, Percentile};
pub use server::StatsdServer;
pub use store::{FlushSnapshot, SharedStore};
