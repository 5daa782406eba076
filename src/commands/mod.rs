//! CLI commands for trunkflow
//!
//! - **init**: write trunkflow.toml and scaffold the story file
//! - **release**: start, stage, deploy and cherry-pick releases
//! - **story**: start, finish and inspect individual stories
//!
//! Everything except `init` receives the `&WorkflowContext` built in main.

pub mod init;
pub mod release;
pub mod story;

pub use init::run_init;
pub use release::{run_release_cherry_pick, run_release_deploy, run_release_stage, run_release_start};
pub use story::{run_story_changes, run_story_finish, run_story_start};
