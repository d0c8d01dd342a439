pub mod manifest;
pub mod results;
