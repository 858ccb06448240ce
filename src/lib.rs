//! Batch automation against the Cascade CMS REST API: image renames with
//! dependent republishing, and sitemap flag updates.

pub mod batch;
pub mod cms;
pub mod config;
pub mod model;
pub mod rows;
pub mod runlog;
pub mod workflow;
