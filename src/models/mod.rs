pub mod entry;
pub mod example;
pub mod loaders;
pub mod provider;
pub mod settings;
pub mod storage;

pub use entry::{Entry, EntryPatch, EntryStatus, ValidationResult};
pub use example::Example;
pub use loaders::{export_converted, load_entry_lines, load_saved_state, save_saved_state};
pub use provider::Provider;
pub use settings::{ApiKeys, ModelSettings, ProviderConfig, Settings};
pub use storage::SavedState;
