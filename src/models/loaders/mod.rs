pub mod text_loader;
pub mod toml_loader;

pub use text_loader::{export_converted, load_entry_lines, split_entry_lines, write_output};
pub use toml_loader::{load_saved_state, save_saved_state};
