// Pipeline modules organized by functionality
pub mod classification;
pub mod utils;
