//! Terminal interface

mod console;

pub use console::Console;
