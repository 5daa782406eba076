//! `story finish`: mark a started story implemented

use super::find_story;
use crate::action::ActionChain;
use crate::core::context::WorkflowContext;
use crate::core::error::FlowResult;
use crate::release::stories;
use crate::tracker::StoryState;

pub fn run(ctx: &WorkflowContext, id: &str) -> FlowResult<()> {
  println!("🏁 Finishing story {}", id);

  ActionChain::run(|chain| {
    let tracker = ctx.tracker();
    let story = find_story(tracker.as_ref(), id)?;
    stories::require_states(&[id.to_string()], std::slice::from_ref(&story), "started", |state| {
      state == StoryState::Started
    })?;

    let undo = story.mark_as_implemented()?;
    chain.push_task(format!("finish story {}", id), undo);

    println!();
    println!("✅ Story {} implemented", id);
    Ok(())
  })
}
