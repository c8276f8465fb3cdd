pub mod ir;
pub mod listing;
