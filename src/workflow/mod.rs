pub mod configuration_ctx;
pub mod configuration_flow;

pub use configuration_ctx::ConfigurationCtx;
pub use configuration_flow::ConfigurationFlow;
