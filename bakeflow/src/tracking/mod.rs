//! In-flight tracking of items in the bake stage.

mod table;

pub use table::TrackingTable;
