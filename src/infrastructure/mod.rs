pub mod engine;
pub mod qix_client;
pub mod rpc_channel;

pub use engine::{
    AppIdentifier, AppSession, AuthMode, EngineClient, EngineConnection, FieldHandle,
    GenericObject, Location, SessionIdentity,
};
pub use qix_client::QixEngineClient;
