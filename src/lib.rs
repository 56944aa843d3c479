pub mod archive;
pub mod compare;
#[cfg(feature = "cli")]
pub mod config;
pub mod curl;
pub mod diff;
pub mod executor;
#[cfg(feature = "cli")]
pub mod printer;
pub mod workbench;

#[cfg(feature = "web")]
pub mod web;
