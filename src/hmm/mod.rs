pub mod context;
pub mod model;
pub mod table;
pub mod tagger;
pub mod trainer;
pub mod unknown;
