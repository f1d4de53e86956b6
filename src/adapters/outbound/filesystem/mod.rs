/// Filesystem adapters for file I/O operations
mod file_reader;
mod file_writer;
mod npm_feed_parser;

pub use file_reader::FileSystemReader;
pub use file_writer::{FileSystemWriter, StdoutPresenter};
pub use npm_feed_parser::{parse_audit, parse_outdated};
