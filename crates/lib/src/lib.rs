//! mvnpack-lib: Maven build orchestration
//!
//! This crate detects Maven projects and builds them into cacheable layers:
//! - `detect`: decides whether a project participates and what it provides/requires
//! - `manager`: chooses how Maven is provided (daemon, distribution, wrapper, search path)
//! - `arguments`: assembles the Maven command line from configuration and bindings
//! - `artifact`: locates the single artifact a build produced
//! - `build`: sequences the stages into one build

pub mod application;
pub mod archive;
pub mod arguments;
pub mod artifact;
pub mod bindings;
pub mod build;
pub mod cache;
pub mod config;
pub mod consts;
pub mod dependency;
pub mod detect;
pub mod distribution;
pub mod execute;
pub mod layer;
pub mod manager;
pub mod plan;
pub mod platform;
pub mod util;
