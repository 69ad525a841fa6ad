pub mod index_info;
pub mod lookup_object;
pub mod search;

pub use index_info::*;
pub use lookup_object::*;
pub use search::*;
