//! Script command service: one entry point per script and collection use case.
//!
//! Every mutation loads the project's record, applies the whole change in
//! memory, validates it and only then writes, so a rejected batch leaves the
//! record untouched.

use super::domain::{
    validate_collection, validate_script, ExecutionMode, LifecycleEvent, ProjectScripts,
    ResolvedReference, Script, ScriptBody, ScriptCommand, ScriptReference, TerminalCollection,
};
use super::repository::ScriptRepository;
use crate::error::ApiError;
use crate::project::{normalize_root, root_key};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Input for creating a script.
#[derive(Debug, Clone)]
pub struct NewScript {
    pub name: String,
    pub root_path: PathBuf,
    pub body: ScriptBody,
    pub execution_mode: ExecutionMode,
    pub close_terminal_after_execution: bool,
}

/// Fields to change on an existing script; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ScriptUpdate {
    pub name: Option<String>,
    pub body: Option<ScriptBody>,
    pub execution_mode: Option<ExecutionMode>,
    pub close_terminal_after_execution: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewCollection {
    pub name: String,
    pub root_path: PathBuf,
    pub lifecycle: Vec<LifecycleEvent>,
    pub script_references: Vec<ScriptReference>,
    pub execution_mode: ExecutionMode,
    pub close_terminal_after_execution: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub lifecycle: Option<Vec<LifecycleEvent>>,
    pub script_references: Option<Vec<ScriptReference>>,
    pub execution_mode: Option<ExecutionMode>,
    pub close_terminal_after_execution: Option<bool>,
}

pub struct ScriptCommandService {
    repo: ScriptRepository,
}

fn validation(result: Result<(), String>) -> Result<(), ApiError> {
    result.map_err(ApiError::ValidationError)
}

fn dedup_lifecycle(events: Vec<LifecycleEvent>) -> Vec<LifecycleEvent> {
    let mut out = Vec::new();
    for event in events {
        if !out.contains(&event) {
            out.push(event);
        }
    }
    out
}

fn ensure_unique_script_name(
    project: &ProjectScripts,
    name: &str,
    except_id: Option<&str>,
) -> Result<(), ApiError> {
    if project
        .scripts
        .iter()
        .any(|s| s.name == name && Some(s.id.as_str()) != except_id)
    {
        return Err(ApiError::DuplicateEntity(format!(
            "Script '{}' already exists in {}",
            name, project.root_path
        )));
    }
    Ok(())
}

fn ensure_unique_collection_name(
    project: &ProjectScripts,
    name: &str,
    except_id: Option<&str>,
) -> Result<(), ApiError> {
    if project
        .terminal_collections
        .iter()
        .any(|c| c.name == name && Some(c.id.as_str()) != except_id)
    {
        return Err(ApiError::DuplicateEntity(format!(
            "Collection '{}' already exists in {}",
            name, project.root_path
        )));
    }
    Ok(())
}

fn script_not_found(id_or_name: &str, root: &str) -> ApiError {
    ApiError::NotFound(format!("script '{}' in {}", id_or_name, root))
}

fn collection_not_found(id_or_name: &str, root: &str) -> ApiError {
    ApiError::NotFound(format!("collection '{}' in {}", id_or_name, root))
}

impl ScriptCommandService {
    pub fn new(repo: ScriptRepository) -> Self {
        Self { repo }
    }

    fn load(&self, root: &Path) -> Result<ProjectScripts, ApiError> {
        self.repo.load(&root_key(root))
    }

    /// Apply `change` to the script `id_or_name`, validate, save.
    fn modify_script(
        &self,
        root: &Path,
        id_or_name: &str,
        change: impl FnOnce(&mut Script) -> Result<(), ApiError>,
    ) -> Result<Script, ApiError> {
        let mut project = self.load(root)?;
        let pos = project
            .script_position(id_or_name)
            .ok_or_else(|| script_not_found(id_or_name, &project.root_path))?;
        let mut script = project.scripts[pos].clone();
        change(&mut script)?;
        validation(validate_script(&script))?;
        ensure_unique_script_name(&project, &script.name, Some(&script.id))?;
        project.scripts[pos] = script.clone();
        self.repo.save(&mut project)?;
        Ok(script)
    }

    pub fn create(&self, input: NewScript) -> Result<Script, ApiError> {
        let root = normalize_root(&input.root_path)?;
        let mut project = self.repo.load(&root)?;
        let script = Script {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            root_path: root,
            body: input.body,
            execution_mode: input.execution_mode,
            close_terminal_after_execution: input.close_terminal_after_execution,
        };
        validation(validate_script(&script))?;
        ensure_unique_script_name(&project, &script.name, None)?;

        project.scripts.push(script.clone());
        self.repo.save(&mut project)?;
        info!(script = %script.name, root = %script.root_path, "Created script");
        Ok(script)
    }

    pub fn update(
        &self,
        root: &Path,
        id_or_name: &str,
        update: ScriptUpdate,
    ) -> Result<Script, ApiError> {
        self.modify_script(root, id_or_name, |script| {
            if let Some(name) = update.name {
                script.name = name;
            }
            if let Some(body) = update.body {
                script.body = body;
            }
            if let Some(mode) = update.execution_mode {
                script.execution_mode = mode;
            }
            if let Some(close) = update.close_terminal_after_execution {
                script.close_terminal_after_execution = close;
            }
            Ok(())
        })
    }

    /// Delete one or more scripts of a root. Every id must resolve before
    /// anything is removed.
    pub fn delete(&self, root: &Path, ids_or_names: &[String]) -> Result<Vec<Script>, ApiError> {
        if ids_or_names.is_empty() {
            return Err(ApiError::ValidationError(
                "No scripts given to delete".to_string(),
            ));
        }
        let mut project = self.load(root)?;

        let mut doomed = Vec::new();
        for id_or_name in ids_or_names {
            let script = project
                .find_script(id_or_name)
                .ok_or_else(|| script_not_found(id_or_name, &project.root_path))?;
            if !doomed.iter().any(|s: &Script| s.id == script.id) {
                doomed.push(script.clone());
            }
        }

        project
            .scripts
            .retain(|s| !doomed.iter().any(|d| d.id == s.id));
        self.repo.save(&mut project)?;
        info!(count = doomed.len(), root = %project.root_path, "Deleted scripts");
        Ok(doomed)
    }

    /// Drop every script and collection of a root.
    pub fn purge_root(&self, root: &Path) -> Result<bool, ApiError> {
        let removed = self.repo.purge(&root_key(root))?;
        if removed {
            info!(root = %root.display(), "Purged scripts for root");
        }
        Ok(removed)
    }

    /// Scripts of one root in stored order, or of every root.
    pub fn list(&self, root: Option<&Path>) -> Result<Vec<Script>, ApiError> {
        match root {
            Some(root) => Ok(self.load(root)?.scripts),
            None => Ok(self
                .repo
                .load_all()?
                .into_iter()
                .flat_map(|p| p.scripts)
                .collect()),
        }
    }

    pub fn get(&self, root: &Path, id_or_name: &str) -> Result<Script, ApiError> {
        let project = self.load(root)?;
        project
            .find_script(id_or_name)
            .cloned()
            .ok_or_else(|| script_not_found(id_or_name, &project.root_path))
    }

    /// Append a command. A single-command script becomes a sequence whose
    /// first entry is the old command.
    pub fn add_command(
        &self,
        root: &Path,
        id_or_name: &str,
        name: &str,
        command: &str,
        priority: Option<u32>,
    ) -> Result<Script, ApiError> {
        self.modify_script(root, id_or_name, |script| {
            let mut commands = match &script.body {
                ScriptBody::Single { .. } => script.body.ordered_commands(),
                ScriptBody::Sequence { commands } => commands.clone(),
            };
            let next = commands.iter().map(|c| c.priority).max().unwrap_or(0) + 1;
            commands.push(ScriptCommand {
                priority: priority.unwrap_or(next),
                name: name.to_string(),
                command: command.to_string(),
            });
            script.body = ScriptBody::Sequence { commands };
            Ok(())
        })
    }

    /// Remove a command by name. The last command cannot be removed.
    pub fn remove_command(
        &self,
        root: &Path,
        id_or_name: &str,
        command_name: &str,
    ) -> Result<Script, ApiError> {
        self.modify_script(root, id_or_name, |script| {
            let commands = match &script.body {
                ScriptBody::Single { .. } => {
                    return Err(ApiError::ValidationError(format!(
                        "Script '{}' has a single command; delete the script instead",
                        script.name
                    )))
                }
                ScriptBody::Sequence { commands } => commands,
            };
            if !commands.iter().any(|c| c.name == command_name) {
                return Err(ApiError::NotFound(format!(
                    "command '{}' in script '{}'",
                    command_name, script.name
                )));
            }
            let remaining: Vec<ScriptCommand> = commands
                .iter()
                .filter(|c| c.name != command_name)
                .cloned()
                .collect();
            if remaining.is_empty() {
                return Err(ApiError::ValidationError(format!(
                    "Cannot remove the last command of script '{}'",
                    script.name
                )));
            }
            script.body = ScriptBody::Sequence {
                commands: remaining,
            };
            Ok(())
        })
    }

    /// Rewrite priorities 1..n following `order` (command names).
    pub fn reorder(
        &self,
        root: &Path,
        id_or_name: &str,
        order: &[String],
    ) -> Result<Script, ApiError> {
        self.modify_script(root, id_or_name, |script| {
            let commands = match &script.body {
                ScriptBody::Single { .. } => {
                    return Err(ApiError::ValidationError(format!(
                        "Script '{}' has a single command",
                        script.name
                    )))
                }
                ScriptBody::Sequence { commands } => commands,
            };
            let mut sorted_order: Vec<&str> = order.iter().map(String::as_str).collect();
            sorted_order.sort_unstable();
            let mut names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
            names.sort_unstable();
            if sorted_order != names {
                return Err(ApiError::ValidationError(format!(
                    "Order must list each command of '{}' exactly once: {}",
                    script.name,
                    names.join(", ")
                )));
            }

            let mut reordered = Vec::with_capacity(commands.len());
            for (i, name) in order.iter().enumerate() {
                if let Some(c) = commands.iter().find(|c| &c.name == name) {
                    reordered.push(ScriptCommand {
                        priority: i as u32 + 1,
                        name: c.name.clone(),
                        command: c.command.clone(),
                    });
                }
            }
            script.body = ScriptBody::Sequence {
                commands: reordered,
            };
            Ok(())
        })
    }

    /// Resolve references given as `id`, `name` or `root::name`, relative to `root`.
    pub fn references_for(
        &self,
        root: &Path,
        specs: &[String],
    ) -> Result<Vec<ScriptReference>, ApiError> {
        let mut cache: HashMap<String, ProjectScripts> = HashMap::new();
        let mut refs = Vec::with_capacity(specs.len());
        for spec in specs {
            let (script_root, id_or_name) = match spec.split_once("::") {
                Some((r, n)) => (root_key(Path::new(r)), n),
                None => (root_key(root), spec.as_str()),
            };
            if !cache.contains_key(&script_root) {
                let project = self.repo.load(&script_root)?;
                cache.insert(script_root.clone(), project);
            }
            let script = cache
                .get(&script_root)
                .and_then(|p| p.find_script(id_or_name))
                .ok_or_else(|| script_not_found(id_or_name, &script_root))?;
            refs.push(script.reference());
        }
        Ok(refs)
    }

    pub fn create_collection(&self, input: NewCollection) -> Result<TerminalCollection, ApiError> {
        let root = normalize_root(&input.root_path)?;
        let mut project = self.repo.load(&root)?;
        let collection = TerminalCollection {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            root_path: root,
            lifecycle: dedup_lifecycle(input.lifecycle),
            script_references: input.script_references,
            close_terminal_after_execution: input.close_terminal_after_execution,
            execution_mode: input.execution_mode,
        };
        validation(validate_collection(&collection))?;
        ensure_unique_collection_name(&project, &collection.name, None)?;

        project.terminal_collections.push(collection.clone());
        self.repo.save(&mut project)?;
        info!(collection = %collection.name, "Created terminal collection");
        Ok(collection)
    }

    pub fn update_collection(
        &self,
        root: &Path,
        id_or_name: &str,
        update: CollectionUpdate,
    ) -> Result<TerminalCollection, ApiError> {
        let mut project = self.load(root)?;
        let pos = project
            .collection_position(id_or_name)
            .ok_or_else(|| collection_not_found(id_or_name, &project.root_path))?;
        let mut collection = project.terminal_collections[pos].clone();
        if let Some(name) = update.name {
            collection.name = name;
        }
        if let Some(lifecycle) = update.lifecycle {
            collection.lifecycle = dedup_lifecycle(lifecycle);
        }
        if let Some(refs) = update.script_references {
            collection.script_references = refs;
        }
        if let Some(mode) = update.execution_mode {
            collection.execution_mode = mode;
        }
        if let Some(close) = update.close_terminal_after_execution {
            collection.close_terminal_after_execution = close;
        }
        validation(validate_collection(&collection))?;
        ensure_unique_collection_name(&project, &collection.name, Some(&collection.id))?;

        project.terminal_collections[pos] = collection.clone();
        self.repo.save(&mut project)?;
        Ok(collection)
    }

    pub fn delete_collection(
        &self,
        root: &Path,
        id_or_name: &str,
    ) -> Result<TerminalCollection, ApiError> {
        let mut project = self.load(root)?;
        let pos = project
            .collection_position(id_or_name)
            .ok_or_else(|| collection_not_found(id_or_name, &project.root_path))?;
        let removed = project.terminal_collections.remove(pos);
        self.repo.save(&mut project)?;
        Ok(removed)
    }

    pub fn list_collections(&self, root: Option<&Path>) -> Result<Vec<TerminalCollection>, ApiError> {
        match root {
            Some(root) => Ok(self.load(root)?.terminal_collections),
            None => Ok(self
                .repo
                .load_all()?
                .into_iter()
                .flat_map(|p| p.terminal_collections)
                .collect()),
        }
    }

    pub fn get_collection(
        &self,
        root: &Path,
        id_or_name: &str,
    ) -> Result<TerminalCollection, ApiError> {
        let project = self.load(root)?;
        project
            .find_collection(id_or_name)
            .cloned()
            .ok_or_else(|| collection_not_found(id_or_name, &project.root_path))
    }

    /// Look up every reference of a collection. Missing scripts come back as
    /// `Dangling`, never as an error.
    pub fn resolve(
        &self,
        collection: &TerminalCollection,
    ) -> Result<Vec<ResolvedReference>, ApiError> {
        let mut cache: HashMap<String, ProjectScripts> = HashMap::new();
        let mut resolved = Vec::with_capacity(collection.script_references.len());
        for reference in &collection.script_references {
            if !cache.contains_key(&reference.root_path) {
                let project = self.repo.load(&reference.root_path)?;
                cache.insert(reference.root_path.clone(), project);
            }
            let script = cache
                .get(&reference.root_path)
                .and_then(|p| p.scripts.iter().find(|s| s.id == reference.id));
            match script {
                Some(script) => resolved.push(ResolvedReference::Resolved(script.clone())),
                None => {
                    warn!(
                        collection = %collection.name,
                        script = %reference.id,
                        "Collection references a missing script"
                    );
                    resolved.push(ResolvedReference::Dangling {
                        id: reference.id.clone(),
                        root_path: reference.root_path.clone(),
                    });
                }
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsRecordStore;
    use std::sync::Arc;

    struct Fixture {
        _store_dir: tempfile::TempDir,
        project: tempfile::TempDir,
        service: ScriptCommandService,
    }

    fn fixture() -> Fixture {
        let store_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsRecordStore::open(store_dir.path()).unwrap());
        Fixture {
            _store_dir: store_dir,
            project: tempfile::tempdir().unwrap(),
            service: ScriptCommandService::new(ScriptRepository::new(store)),
        }
    }

    fn single(f: &Fixture, name: &str, command: &str) -> Script {
        f.service
            .create(NewScript {
                name: name.to_string(),
                root_path: f.project.path().to_path_buf(),
                body: ScriptBody::Single {
                    command: command.to_string(),
                },
                execution_mode: ExecutionMode::SameTerminal,
                close_terminal_after_execution: false,
            })
            .unwrap()
    }

    #[test]
    fn names_are_unique_per_root() {
        let f = fixture();
        single(&f, "build", "cargo build");
        let err = f
            .service
            .create(NewScript {
                name: "build".to_string(),
                root_path: f.project.path().to_path_buf(),
                body: ScriptBody::Single {
                    command: "make".to_string(),
                },
                execution_mode: ExecutionMode::SameTerminal,
                close_terminal_after_execution: false,
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEntity(_)));
    }

    #[test]
    fn batch_delete_is_all_or_nothing() {
        let f = fixture();
        let a = single(&f, "a", "true");
        single(&f, "b", "true");

        let err = f
            .service
            .delete(f.project.path(), &[a.id.clone(), "missing".to_string()])
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(f.service.list(Some(f.project.path())).unwrap().len(), 2);

        let removed = f
            .service
            .delete(f.project.path(), &["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert!(f.service.list(Some(f.project.path())).unwrap().is_empty());
    }

    #[test]
    fn add_command_promotes_single_to_sequence() {
        let f = fixture();
        single(&f, "dev", "npm install");
        let script = f
            .service
            .add_command(f.project.path(), "dev", "serve", "npm run dev", None)
            .unwrap();
        let commands = script.body.ordered_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].command, "npm install");
        assert_eq!(commands[1].priority, 2);
        assert_eq!(commands[1].name, "serve");
    }

    #[test]
    fn reorder_rewrites_priorities_and_rejects_partial_lists() {
        let f = fixture();
        single(&f, "dev", "one");
        f.service
            .add_command(f.project.path(), "dev", "two", "two", None)
            .unwrap();
        f.service
            .add_command(f.project.path(), "dev", "three", "three", None)
            .unwrap();

        let order = vec!["three".to_string(), "main".to_string(), "two".to_string()];
        let script = f.service.reorder(f.project.path(), "dev", &order).unwrap();
        let names: Vec<String> = script
            .body
            .ordered_commands()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, order);

        let partial = vec!["three".to_string()];
        assert!(matches!(
            f.service.reorder(f.project.path(), "dev", &partial),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn last_command_cannot_be_removed() {
        let f = fixture();
        single(&f, "dev", "one");
        f.service
            .add_command(f.project.path(), "dev", "two", "two", None)
            .unwrap();
        f.service
            .remove_command(f.project.path(), "dev", "main")
            .unwrap();
        assert!(matches!(
            f.service.remove_command(f.project.path(), "dev", "two"),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn deleted_script_leaves_dangling_reference() {
        let f = fixture();
        let a = single(&f, "a", "true");
        let b = single(&f, "b", "true");
        let refs = f
            .service
            .references_for(f.project.path(), &["a".to_string(), b.id.clone()])
            .unwrap();
        let collection = f
            .service
            .create_collection(NewCollection {
                name: "all".to_string(),
                root_path: f.project.path().to_path_buf(),
                lifecycle: vec![LifecycleEvent::Resume, LifecycleEvent::Resume],
                script_references: refs,
                execution_mode: ExecutionMode::SameTerminal,
                close_terminal_after_execution: false,
            })
            .unwrap();
        assert_eq!(collection.lifecycle, vec![LifecycleEvent::Resume]);

        f.service.delete(f.project.path(), &[a.id.clone()]).unwrap();
        let collection = f.service.get_collection(f.project.path(), "all").unwrap();
        let resolved = f.service.resolve(&collection).unwrap();
        assert!(matches!(&resolved[0], ResolvedReference::Dangling { id, .. } if *id == a.id));
        assert!(matches!(&resolved[1], ResolvedReference::Resolved(s) if s.id == b.id));
    }

    #[test]
    fn purge_root_drops_scripts_and_collections() {
        let f = fixture();
        single(&f, "a", "true");
        assert!(f.service.purge_root(f.project.path()).unwrap());
        assert!(f.service.list(None).unwrap().is_empty());
        assert!(f.service.list_collections(None).unwrap().is_empty());
    }
}
