pub mod archive;
pub mod binding;
pub mod cdn;
pub mod download;
pub mod host;
pub mod http;
pub mod install;
pub mod package;
pub mod platform;
pub mod runtime;
pub mod settings;
pub mod version;
