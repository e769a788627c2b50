pub mod analysis;
pub mod extract;
pub mod normalize;
pub mod prompt;
pub mod records;

pub use analysis::ScanAnalyzer;
pub use records::ScanRecords;
