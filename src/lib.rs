//! Fill missing Android string resources in every locale file with
//! machine translations of the base `values/strings.xml`.

pub mod config;
pub mod discovery;
pub mod error;
pub mod locale;
pub mod merge;
pub mod resource;
pub mod retry;
pub mod translation;
