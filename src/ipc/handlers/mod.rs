pub mod apps;
pub mod assets;
pub mod core;
pub mod profile;
pub mod session;
