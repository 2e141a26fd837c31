pub mod spreadsheet_loader;

pub use spreadsheet_loader::{extract_uris, load_uris_from_spreadsheet};
