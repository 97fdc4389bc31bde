//! The authoritative command set: name -> handler mapping plus the bulk
//! registration call that pushes the definitions to Discord.

use anyhow::Result;
use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::http::Http;
use serenity::model::application::command::Command;
use thiserror::Error;

use crate::commands;

/// The bot's commands. Dispatch matches on this tag rather than on the raw
/// interaction string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Ping,
    Embed,
    RefreshCommands,
    Verify,
}

impl BotCommand {
    /// Wire name shown in the platform's command picker.
    pub fn name(self) -> &'static str {
        match self {
            BotCommand::Ping => "ping",
            BotCommand::Embed => "embed",
            BotCommand::RefreshCommands => "refreshcommands",
            BotCommand::Verify => "verify",
        }
    }
}

/// One registered command: its dispatch tag and its definition builder.
pub struct CommandDescriptor {
    pub command: BotCommand,
    pub build: fn() -> CreateApplicationCommand,
}

impl CommandDescriptor {
    pub fn name(&self) -> &'static str {
        self.command.name()
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate command name: {0}")]
    DuplicateCommand(String),
}

/// Holds the command descriptors, built once at startup and immutable
/// afterwards.
pub struct CommandRegistry {
    descriptors: Vec<CommandDescriptor>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        CommandRegistry {
            descriptors: Vec::new(),
        }
    }

    /// The full production command set.
    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut registry = CommandRegistry::new();
        registry.register(CommandDescriptor {
            command: BotCommand::Ping,
            build: commands::ping::register,
        })?;
        registry.register(CommandDescriptor {
            command: BotCommand::Embed,
            build: commands::embed::register,
        })?;
        registry.register(CommandDescriptor {
            command: BotCommand::RefreshCommands,
            build: commands::refresh::register,
        })?;
        registry.register(CommandDescriptor {
            command: BotCommand::Verify,
            build: commands::verify::register,
        })?;
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        if self.resolve(descriptor.name()).is_some() {
            return Err(RegistryError::DuplicateCommand(descriptor.name().to_owned()));
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<&CommandDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.name() == name)
    }

    /// Registration order, as pushed at startup.
    pub fn descriptors(&self) -> &[CommandDescriptor] {
        &self.descriptors
    }

    /// Builds the full definition list for bulk registration.
    pub fn definitions(&self) -> Vec<CreateApplicationCommand> {
        self.descriptors
            .iter()
            .map(|descriptor| (descriptor.build)())
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        CommandRegistry::new()
    }
}

/// Replaces the platform-side global command set with the registry's full
/// list in a single bulk call.
pub async fn publish_global_commands(http: &Http, registry: &CommandRegistry) -> Result<()> {
    let definitions = registry.definitions();
    Command::set_global_application_commands(http, |commands| {
        for definition in definitions {
            commands.add_application_command(definition);
        }
        commands
    })
    .await?;

    info!("Global application commands registered successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_command_names() {
        let registry = CommandRegistry::with_defaults().unwrap();

        let names: Vec<&str> = registry
            .descriptors()
            .iter()
            .map(|descriptor| descriptor.name())
            .collect();

        assert_eq!(names, vec!["ping", "embed", "refreshcommands", "verify"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = CommandRegistry::with_defaults().unwrap();

        let result = registry.register(CommandDescriptor {
            command: BotCommand::Ping,
            build: commands::ping::register,
        });

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateCommand(name)) if name == "ping"
        ));
    }

    #[test]
    fn test_resolve_unknown_command() {
        let registry = CommandRegistry::with_defaults().unwrap();
        assert!(registry.resolve("doesnotexist").is_none());
    }

    #[test]
    fn test_definitions_match_descriptor_names() {
        let registry = CommandRegistry::with_defaults().unwrap();
        let definitions = registry.definitions();
        assert_eq!(definitions.len(), 4);

        let definition_names: Vec<String> = definitions
            .iter()
            .map(|definition| {
                definition
                    .0
                    .get("name")
                    .unwrap()
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();

        assert_eq!(
            definition_names,
            vec!["ping", "embed", "refreshcommands", "verify"]
        );
    }

    #[test]
    fn test_embed_definition_options() {
        let registry = CommandRegistry::with_defaults().unwrap();
        let descriptor = registry.resolve("embed").unwrap();
        let definition = (descriptor.build)();

        let options = definition.0.get("options").unwrap().as_array().unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0]["name"], "title");
        assert_eq!(options[0]["required"], true);
        assert_eq!(options[1]["name"], "description");
        assert_eq!(options[1]["required"], true);
        assert_eq!(options[2]["name"], "image");
        assert_eq!(options[2]["required"], false);
    }

    #[test]
    fn test_refreshcommands_is_admin_gated() {
        let registry = CommandRegistry::with_defaults().unwrap();
        let descriptor = registry.resolve("refreshcommands").unwrap();
        let definition = (descriptor.build)();

        assert!(definition.0.get("default_member_permissions").is_some());
    }
}
