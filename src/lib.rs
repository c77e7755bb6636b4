pub mod gtfs;
pub mod graph;
pub mod report;
pub mod shared;
pub mod tt;
