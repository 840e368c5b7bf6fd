pub mod api_operations;
pub mod forward;
pub mod orchestrator;
pub mod tool_calls;
