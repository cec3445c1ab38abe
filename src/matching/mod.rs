// Comment matching — prompt construction, reply parsing and the pairwise driver.

pub mod pairwise;
pub mod prompt;
pub mod score;

pub use pairwise::{ComparisonReport, ComparisonResult, PairWarning, PairwiseComparator};
pub use score::{is_flagged, parse_score, FLAG_THRESHOLD};
