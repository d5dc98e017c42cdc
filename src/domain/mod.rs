// Domain layer - Plain data shared by every other layer
pub mod dashboard;
pub mod report;
pub mod telemetry;
