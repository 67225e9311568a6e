use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use waypoint_config::WizardDef;
use waypoint_resolver::{ResolvedWizard, Resolver, StandardResolver};

mod script;

/// Waypoint - drive guarded, skippable multi-step wizards
#[derive(Parser)]
#[command(name = "waypoint")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.waypoint)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a wizard against a command script
  Run {
    /// Wizard definition file, or a name under <data-dir>/wizards/
    wizard: String,

    /// JSON file merged over the definition's initial values
    #[arg(long)]
    values: Option<PathBuf>,

    /// Command script (default: stdin)
    #[arg(long)]
    script: Option<PathBuf>,
  },

  /// Print the initial state of a wizard
  Inspect {
    /// Wizard definition file, or a name under <data-dir>/wizards/
    wizard: String,

    /// JSON file merged over the definition's initial values
    #[arg(long)]
    values: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(data_dir) => data_dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".waypoint"),
  };

  match cli.command {
    Some(Commands::Run {
      wizard,
      values,
      script,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_wizard(&wizard, values, script, &data_dir))?;
    }
    Some(Commands::Inspect { wizard, values }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(inspect_wizard(&wizard, values, &data_dir))?;
    }
    None => {
      println!("waypoint - use --help to see available commands");
    }
  }

  Ok(())
}

async fn run_wizard(
  wizard: &str,
  values: Option<PathBuf>,
  script: Option<PathBuf>,
  data_dir: &Path,
) -> Result<()> {
  let resolved = load_wizard(wizard, values, data_dir).await?;
  eprintln!("Loaded wizard: {}", resolved.name);

  let wizard = resolved.build().await.context("failed to build wizard")?;

  let commands = match script {
    Some(path) => tokio::fs::read_to_string(&path)
      .await
      .with_context(|| format!("failed to read script file: {}", path.display()))?,
    None => {
      let mut input = String::new();
      io::stdin()
        .read_to_string(&mut input)
        .context("failed to read commands from stdin")?;
      input
    }
  };

  for (index, line) in commands.lines().enumerate() {
    let Some(command) =
      script::parse_line(line).with_context(|| format!("line {}: {}", index + 1, line.trim()))?
    else {
      continue;
    };

    let output = command
      .execute(&wizard)
      .await
      .with_context(|| format!("line {}: {}", index + 1, command))?;
    println!("{}", serde_json::to_string(&output)?);
  }

  let ctx = wizard.context();
  eprintln!(
    "Finished on step '{}' ({}%, {})",
    ctx.active_step_id(),
    ctx.progress_percent(),
    ctx.state()
  );

  Ok(())
}

async fn inspect_wizard(wizard: &str, values: Option<PathBuf>, data_dir: &Path) -> Result<()> {
  let resolved = load_wizard(wizard, values, data_dir).await?;

  let wizard_id = resolved.wizard_id.clone();
  let name = resolved.name.clone();
  let description = resolved.description.clone();
  let wizard = resolved.build().await.context("failed to build wizard")?;
  let ctx = wizard.context();

  let actions: Vec<Value> = ctx
    .actions()
    .iter()
    .map(|action| {
      json!({
        "key": action.key(),
        "label": action.label_text(),
        "variant": action.variant_kind(),
      })
    })
    .collect();

  let output = json!({
    "wizard_id": wizard_id,
    "name": name,
    "description": description,
    "active_step": ctx.active_step_id(),
    "visible_steps": ctx.visible_steps(),
    "progress_percent": ctx.progress_percent(),
    "actions": actions,
    "steps": ctx.step_ui(),
  });

  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

/// Resolve a wizard argument to a definition file.
///
/// An existing path wins; otherwise the argument names
/// `<data-dir>/wizards/<name>.json`.
fn wizard_path(wizard: &str, data_dir: &Path) -> PathBuf {
  let path = PathBuf::from(wizard);
  if path.exists() {
    path
  } else {
    data_dir.join("wizards").join(format!("{wizard}.json"))
  }
}

async fn load_wizard(
  wizard: &str,
  values: Option<PathBuf>,
  data_dir: &Path,
) -> Result<ResolvedWizard> {
  let wizard_file = wizard_path(wizard, data_dir);
  debug!(path = %wizard_file.display(), "loading wizard definition");

  let content = tokio::fs::read_to_string(&wizard_file)
    .await
    .with_context(|| format!("failed to read wizard file: {}", wizard_file.display()))?;

  let mut wizard_def: WizardDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse wizard file: {}", wizard_file.display()))?;

  if let Some(values_file) = values {
    let content = tokio::fs::read_to_string(&values_file)
      .await
      .with_context(|| format!("failed to read values file: {}", values_file.display()))?;
    let overrides: Value = serde_json::from_str(&content)
      .with_context(|| format!("failed to parse values file: {}", values_file.display()))?;
    merge_values(&mut wizard_def.initial_values, overrides);
  }

  StandardResolver::new()
    .resolve(wizard_def)
    .context("failed to resolve wizard")
}

/// Shallow merge: top-level keys of `overrides` replace those in `base`.
fn merge_values(base: &mut Value, overrides: Value) {
  match (base, overrides) {
    (Value::Object(base), Value::Object(overrides)) => base.extend(overrides),
    (base, overrides) => *base = overrides,
  }
}
