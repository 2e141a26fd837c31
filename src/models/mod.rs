pub mod configuration;
pub mod loaders;
pub mod selection;

pub use configuration::{Configuration, NodeKey};
pub use loaders::load_uris_from_spreadsheet;
pub use selection::{FieldValue, Selection};
