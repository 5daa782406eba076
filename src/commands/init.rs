use std::env;
use std::fs;
use std::io::{self, Write};

use crate::core::config::FlowConfig;
use crate::core::error::{FlowResult, ResultExt};
use crate::core::vcs::SystemGit;

const STORY_FILE_TEMPLATE: &str = r#"# Stories known to trunkflow.
#
# [[stories]]
# id = "ABC-1"
# title = "Export invoices"
# state = "new"   # new, started, implemented, staged, released
"#;

/// Run the init command to set up trunkflow configuration
pub fn run_init(force: bool) -> FlowResult<()> {
  let current_dir = env::current_dir()?;
  let git = SystemGit::open(&current_dir)?;
  let root = git.work_tree().to_path_buf();

  println!("📦 Found repository at: {}", root.display());

  if FlowConfig::exists(&root) && !force {
    print!("⚠️  Configuration already exists. Overwrite? [y/N]: ");
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    if !response.trim().eq_ignore_ascii_case("y") {
      println!("Aborted.");
      return Ok(());
    }
  }

  let mut config = FlowConfig::default();
  for candidate in ["develop", "main", "master"] {
    if git.ref_exists(&format!("refs/heads/{}", candidate))? {
      config.branches.trunk = candidate.to_string();
      break;
    }
  }
  println!("🌿 Trunk branch: {}", config.branches.trunk);

  if !root.join(&config.version.file).exists() {
    println!(
      "⚠️  {} not found; set [version] file before starting a release",
      config.version.file.display()
    );
  }

  println!("\n💾 Saving configuration...");
  let config_path = config.save(&root)?;

  let story_file = root.join(&config.tracker.path);
  if !story_file.exists() {
    if let Some(dir) = story_file.parent() {
      fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
      // keep tracker state out of commits and clean-tree checks
      fs::write(dir.join(".gitignore"), "*\n")?;
    }
    fs::write(&story_file, STORY_FILE_TEMPLATE)
      .with_context(|| format!("Failed to write {}", story_file.display()))?;
    println!("   Created {}", story_file.display());
  }

  println!("\n✅ Successfully initialized trunkflow!");
  println!("   Configuration saved to: {}", config_path.display());
  println!("\n🚀 Next steps:");
  println!("   1. Review the [branches] and [version] sections of trunkflow.toml");
  println!("   2. Add your stories to {}", config.tracker.path.display());
  println!("   3. Run: trunkflow story start <id>");

  Ok(())
}
