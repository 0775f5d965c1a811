pub mod list;
pub mod sections;
pub mod status;
pub mod sync;
