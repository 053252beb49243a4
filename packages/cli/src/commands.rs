//! Command execution against a [`JsonFileStore`].

use std::path::Path;

use serde_json::{json, Value as JsonValue};

use nodetree::{
    json_utils, EditError, JsonFileStore, MutationEngine, Node, Structure, StructureEditor,
    StructureGuard,
};

use crate::{read_file, Cli, CliError, Command};

fn to_json<T: serde::Serialize>(value: &T) -> Result<JsonValue, CliError> {
    serde_json::to_value(value).map_err(|e| CliError::Output(e.to_string()))
}

fn parse_node(text: &str) -> Result<Node, CliError> {
    json_utils::parse_node(text).map_err(CliError::InvalidNode)
}

fn load_structure_file(path: &Path) -> Result<Structure, CliError> {
    let text = read_file(path)?;
    json_utils::parse_structure(&text).map_err(|message| CliError::InvalidStructure {
        path: path.to_path_buf(),
        message,
    })
}

fn validate(guard: &StructureGuard, file: &Path) -> Result<JsonValue, CliError> {
    let structure = load_structure_file(file)?;
    guard.validate(&structure).map_err(EditError::from)?;
    Ok(json!({
        "valid": true,
        "shape": structure.shape(),
        "nodes": nodetree::count_nodes(&structure),
    }))
}

/// Open the store at `root`; `create` makes the directory if it is missing.
fn open_store(root: &Path, create: bool) -> Result<JsonFileStore, CliError> {
    let store = if create {
        JsonFileStore::open_or_create(root.to_path_buf())
    } else {
        JsonFileStore::new(root.to_path_buf())
    };
    store.map_err(|e| CliError::Edit(e.into()))
}

/// Run one command and return the JSON document it prints.
pub fn run(cli: Cli) -> Result<JsonValue, CliError> {
    let guard = StructureGuard::new(cli.guard_limits()?);
    let create = matches!(cli.command, Command::Replace { .. });
    let open_editor = |root: &Path| -> Result<StructureEditor<JsonFileStore>, CliError> {
        Ok(StructureEditor::new(
            open_store(root, create)?,
            MutationEngine::new(guard.clone()),
        ))
    };

    match cli.command {
        Command::Validate { file } => validate(&guard, &file),
        Command::List { kind } => {
            let ids = open_store(&cli.root, false)?
                .list(kind)
                .map_err(EditError::from)?;
            let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
            Ok(json!(ids))
        }
        Command::Get {
            id,
            path,
            annotate,
            summary,
            depth,
        } => {
            let mut editor = open_editor(&cli.root)?;
            if let Some(path) = path {
                to_json(&editor.node(&id, &path)?)
            } else if annotate {
                to_json(&editor.annotate(&id)?)
            } else if summary {
                to_json(&editor.summarize(&id, depth)?)
            } else {
                to_json(&editor.structure(&id)?)
            }
        }
        Command::Add {
            id,
            target,
            node,
            position,
        } => {
            let mut editor = open_editor(&cli.root)?;
            let insertion = editor.add_node(&id, &target, parse_node(&node)?, position)?;
            Ok(json!({
                "id": id.to_string(),
                "path": insertion.path.to_string(),
            }))
        }
        Command::Edit { id, path, node } => {
            let mut editor = open_editor(&cli.root)?;
            let replacement = editor.edit_node(&id, &path, parse_node(&node)?)?;
            Ok(json!({
                "id": id.to_string(),
                "path": replacement.path.to_string(),
                "previous": to_json(&replacement.previous)?,
            }))
        }
        Command::Delete { id, path } => {
            let mut editor = open_editor(&cli.root)?;
            let removal = editor.delete_node(&id, &path)?;
            Ok(json!({
                "id": id.to_string(),
                "path": removal.path.to_string(),
                "removed": to_json(&removal.removed)?,
            }))
        }
        Command::Move {
            id,
            source,
            target,
            position,
        } => {
            let mut editor = open_editor(&cli.root)?;
            let relocation = editor.move_node(&id, &source, &target, position)?;
            Ok(json!({
                "id": id.to_string(),
                "source": relocation.source.to_string(),
                "target": relocation.target.to_string(),
                "position": relocation.position,
                "newPath": relocation.new_path.to_string(),
            }))
        }
        Command::Duplicate { id, path } => {
            let mut editor = open_editor(&cli.root)?;
            let insertion = editor.duplicate_node(&id, &path)?;
            Ok(json!({
                "id": id.to_string(),
                "path": insertion.path.to_string(),
            }))
        }
        Command::Replace { id, file } => {
            let structure = load_structure_file(&file)?;
            let mut editor = open_editor(&cli.root)?;
            editor.replace_structure(&id, &structure)?;
            Ok(json!({
                "id": id.to_string(),
                "shape": structure.shape(),
                "nodes": nodetree::count_nodes(&structure),
            }))
        }
    }
}
