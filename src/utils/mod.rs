pub mod data_path;
pub mod json_path;
pub mod paths;
pub mod redact;
pub mod suggest;
pub mod template;
pub mod text;
