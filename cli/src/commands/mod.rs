pub mod deploy;
pub mod login;
pub mod project;
pub mod version;
