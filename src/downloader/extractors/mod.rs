// InfoExtractor module - stream metadata extraction
//
// The extractor only lists what a page offers (formats, title, description);
// choosing among them is FormatSelector's job.

mod cli;
mod traits;

pub use cli::CliInfoExtractor;
pub use traits::{ExtractionOptions, InfoExtractor};
