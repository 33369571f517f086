pub mod digest;
pub mod mcp;
