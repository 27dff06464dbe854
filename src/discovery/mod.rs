pub mod service_discovery;

pub use service_discovery::{ServiceDiscovery, StaticDiscovery};
