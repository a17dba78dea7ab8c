//! Reader stages

pub mod buffer;
pub mod pcd;
pub mod text;

pub use buffer::{BufferReader, BUFFER_READER};
pub use pcd::{PcdDataFormat, PcdField, PcdFieldType, PcdHeader, PcdReader};
pub use text::{Delimiter, TextReader, TextReaderOptions, TextSchema};
