mod serve_command;
pub use serve_command::*;

mod extract_command;
pub use extract_command::*;
