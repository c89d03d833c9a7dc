// Graph operations. Each operation is a free function over `Fst`.

pub mod arcsort;
pub mod compose;
pub mod connect;
pub mod determinize;
pub mod project;
pub mod reverse;
pub mod rm_epsilon;
pub mod shortest_distance;
pub mod shortest_path;

pub use arcsort::{ArcOrder, arc_sort, ilabel_compare, olabel_compare};
pub use compose::compose;
pub use connect::connect;
pub use determinize::determinize;
pub use project::{ProjectType, project};
pub use reverse::reverse;
pub use rm_epsilon::rm_epsilon;
pub use shortest_distance::{shortest_distance, shortest_distance_to_final};
pub use shortest_path::{WeightedPath, n_shortest_paths};
