pub mod file_source;
pub mod observability;
pub mod signal_sink;

pub use file_source::{CsvCandleFile, JsonCandleFile, source_for_path, symbol_from_path};
pub use signal_sink::{InMemorySignalSink, JsonLinesSignalSink};
