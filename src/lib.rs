//! kopsplan: kops cluster spec synthesis and cloud resource classification
//!
//! - [`config`] turns flat parameters into a normalized [`config::ClusterConfig`]
//! - [`spec`] synthesizes the cluster spec and instance groups from it
//! - [`resources`] classifies the resources an engine enumerated
//! - [`engine`] drives external apply, teardown and validation engines

pub mod cli;
pub mod config;
pub mod engine;
pub mod resources;
pub mod spec;
