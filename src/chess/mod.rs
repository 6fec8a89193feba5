mod eco;
mod error;
mod filer;
pub mod log;
mod merge;
mod normalize;
mod parser;
mod reader;
mod sequence;
mod summary;
mod types;

pub use eco::EcoTable;
pub use error::{ErrorAccumulator, SortError};
pub use filer::{
    FileOutcome, Filer, GroupingMode, check_prerequisites, clean_player_name, render_record,
    sanitize_name,
};
pub use merge::{MergeSummary, merge_dir, merge_group_dirs};
pub use normalize::fold_accents;
pub use parser::PgnParser;
pub use reader::{
    CompressionMode, ParsedInputs, PgnInput, discover_inputs, open_input_stream, parse_inputs,
    read_input,
};
pub use sequence::SequenceRegistry;
pub use summary::{FilingSummary, RunReport};
pub use types::{GameRecord, PreserveSet};
