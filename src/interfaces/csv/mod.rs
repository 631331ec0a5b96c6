//! CSV inputs for the command line tool.

pub mod catalog_reader;
pub mod item_reader;
