//! Subcommand handlers.

use crate::{Commands, ConfigAction};
use loanflow_ml::config::{PipelineConfig, RunContext, StoreConfig, load_config};
use loanflow_ml::preprocess::TargetValueMapping;
use loanflow_ml::{DataTable, LoanModel, SchemaDeclaration, TrainingPipeline, open_store};
use std::path::{Path, PathBuf};

pub fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Run { run_id } => handle_run(workspace, config_file, run_id),
        Commands::Predict { model, input, json } => {
            handle_predict(&anchor(workspace, &model), &anchor(workspace, &input), json)
        }
        Commands::Config { action } => handle_config(action, workspace, config_file),
    }
}

/// Resolve `path` against the workspace unless it is absolute.
fn anchor(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

/// Make every configured path absolute with respect to the workspace.
fn anchor_config(mut config: PipelineConfig, workspace: &Path) -> PipelineConfig {
    config.artifact_dir = anchor(workspace, &config.artifact_dir);
    config.schema_path = anchor(workspace, &config.schema_path);
    config.store = match config.store {
        StoreConfig::Jsonl { root } => StoreConfig::Jsonl {
            root: anchor(workspace, &root),
        },
        StoreConfig::Sqlite { db_path } => StoreConfig::Sqlite {
            db_path: anchor(workspace, &db_path),
        },
    };
    config
}

fn load(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let config = load_config(Some(workspace), config_file)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    Ok(anchor_config(config, workspace))
}

fn handle_run(
    workspace: &Path,
    config_file: Option<&Path>,
    run_id: Option<String>,
) -> anyhow::Result<()> {
    let config = load(workspace, config_file)?;
    let schema = SchemaDeclaration::load(&config.schema_path)
        .map_err(|e| anyhow::anyhow!("Failed to load schema: {}", e))?;
    let store = open_store(&config.store);

    let ctx = match run_id {
        Some(id) => RunContext::with_run_id(&config.artifact_dir, id),
        None => RunContext::new(&config.artifact_dir),
    };
    let pipeline = TrainingPipeline::new(config, schema, store);
    let run = pipeline.run(&ctx)?;

    let m = run.trainer.metrics;
    println!("Run {} complete", run.run_id);
    println!("  model:     {}", run.trainer.trained_model_path.display());
    println!("  accuracy:  {:.4}", m.accuracy);
    println!("  precision: {:.4}", m.precision);
    println!("  recall:    {:.4}", m.recall);
    println!("  f1:        {:.4}", m.f1);
    Ok(())
}

fn handle_predict(model_path: &Path, input: &Path, json: bool) -> anyhow::Result<()> {
    let model = LoanModel::load(model_path)
        .map_err(|e| anyhow::anyhow!("Failed to load model: {}", e))?;
    let table = DataTable::read_csv(input)?;
    let predictions = model.predict(&table)?;
    tracing::info!(rows = predictions.len(), input = %input.display(), "Scored records");

    if json {
        println!("{}", serde_json::to_string(&predictions)?);
    } else {
        let mapping = TargetValueMapping;
        for label in predictions {
            match mapping.reverse(label) {
                Some(name) => println!("{label}\t{name}"),
                None => println!("{label}"),
            }
        }
    }
    Ok(())
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace.join("loanflow.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            let toml_str = toml::to_string_pretty(&PipelineConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace, config_file)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}
