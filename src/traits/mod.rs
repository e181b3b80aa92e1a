pub mod command_table;
pub mod toolkit;

pub use command_table::*;
pub use toolkit::*;
