pub mod import;
pub mod model;
pub mod remote;
pub mod store;
