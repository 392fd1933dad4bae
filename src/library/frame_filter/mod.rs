mod fingerprint;
mod near_duplicate_filter;


pub use fingerprint::Fingerprint;
pub use near_duplicate_filter::NearDuplicateFilter;
