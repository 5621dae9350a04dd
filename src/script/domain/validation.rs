//! Script and collection validation owned by the script domain.

use super::{ScriptBody, Script, TerminalCollection};
use std::collections::HashSet;

fn check_name(kind: &str, name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{} name cannot be empty", kind));
    }
    if name.trim() != name {
        return Err(format!("{} name '{}' has surrounding whitespace", kind, name));
    }
    if name.chars().any(char::is_control) {
        return Err(format!("{} name '{}' contains control characters", kind, name.escape_debug()));
    }
    Ok(())
}

/// Validate a script before it is written.
pub fn validate_script(script: &Script) -> Result<(), String> {
    check_name("Script", &script.name)?;
    if script.root_path.trim().is_empty() {
        return Err(format!("Script '{}' has no root path", script.name));
    }

    match &script.body {
        ScriptBody::Single { command } => {
            if command.trim().is_empty() {
                return Err(format!("Script '{}' has an empty command", script.name));
            }
        }
        ScriptBody::Sequence { commands } => {
            if commands.is_empty() {
                return Err(format!("Script '{}' has no commands", script.name));
            }
            let mut seen = HashSet::new();
            for command in commands {
                check_name("Command", &command.name)?;
                if !seen.insert(command.name.as_str()) {
                    return Err(format!(
                        "Script '{}' has two commands named '{}'",
                        script.name, command.name
                    ));
                }
                if command.command.trim().is_empty() {
                    return Err(format!(
                        "Command '{}' of script '{}' is empty",
                        command.name, script.name
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Validate a terminal collection before it is written.
pub fn validate_collection(collection: &TerminalCollection) -> Result<(), String> {
    check_name("Collection", &collection.name)?;
    if collection.root_path.trim().is_empty() {
        return Err(format!("Collection '{}' has no root path", collection.name));
    }
    if collection.script_references.is_empty() {
        return Err(format!(
            "Collection '{}' must reference at least one script",
            collection.name
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::domain::{ExecutionMode, ScriptCommand};

    fn script(body: ScriptBody) -> Script {
        Script {
            id: "id".to_string(),
            name: "dev".to_string(),
            root_path: "/p".to_string(),
            body,
            execution_mode: ExecutionMode::SameTerminal,
            close_terminal_after_execution: false,
        }
    }

    #[test]
    fn rejects_empty_and_duplicate_commands() {
        assert!(validate_script(&script(ScriptBody::Single {
            command: "  ".to_string()
        }))
        .is_err());
        assert!(validate_script(&script(ScriptBody::Sequence { commands: vec![] })).is_err());

        let dup = ScriptCommand {
            priority: 1,
            name: "x".to_string(),
            command: "true".to_string(),
        };
        assert!(validate_script(&script(ScriptBody::Sequence {
            commands: vec![dup.clone(), dup]
        }))
        .is_err());
    }

    #[test]
    fn rejects_padded_names() {
        let mut s = script(ScriptBody::Single {
            command: "true".to_string(),
        });
        s.name = " dev".to_string();
        assert!(validate_script(&s).is_err());
    }
}
