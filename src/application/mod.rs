// Application layer - Use cases and the ports they depend on
pub mod battery_source;
pub mod dashboard_service;
pub mod poller;
pub mod publish_service;
pub mod sampler;
pub mod store;
