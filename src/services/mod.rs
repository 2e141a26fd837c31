pub mod cache_warming;
pub mod grouping;
pub mod selection_replay;

pub use cache_warming::{locate_sheet, warm, WarmReport};
pub use grouping::{group_by_app, group_by_node, AppGroup, NodeGroup};
pub use selection_replay::apply_configuration;
