pub mod enums;
pub mod error;
pub mod schema;
pub mod state;
pub mod store;
pub mod utils;
