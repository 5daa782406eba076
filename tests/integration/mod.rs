//! Integration tests driving the trunkflow binary against temporary
//! repositories with a bare remote

mod helpers;
mod test_cherry_pick;
mod test_init;
mod test_release;
mod test_story;
