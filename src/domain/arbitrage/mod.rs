pub mod detector;
pub mod opportunity;

pub use detector::{compute_spread, OpportunityScanner, Spread};
pub use opportunity::{NewOpportunity, Opportunity};
