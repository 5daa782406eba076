//! Logical changes and their reconciliation against branches
//!
//! - **group**: correlates physical commits into [`Change`]s by Change-Id and
//!   collects changes per story
//! - **planner**: decides which changes a target branch is still missing

pub mod group;
pub mod planner;

pub use group::{Change, StoryChangeGroup, group_by_change_id, group_by_story_id};
pub use planner::CherryPickPlanner;
