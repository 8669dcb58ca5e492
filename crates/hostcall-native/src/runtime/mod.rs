pub mod context;

mod bindings;
mod conversions;


pub use bindings::export_names;
pub use context::HostContext;
pub use conversions::{error_info_from_js, error_to_js, js_to_structured, structured_to_js};
