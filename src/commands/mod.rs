//! Command definitions and handlers, one module per slash command.

pub mod embed;
pub mod ping;
pub mod refresh;
pub mod verify;

use serenity::model::application::interaction::application_command::CommandDataOption;

/// Utility function to get string option from slash command
pub fn get_string_option(options: &[CommandDataOption], name: &str) -> Option<String> {
    options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_ref())
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_string_option_empty() {
        let options = vec![];
        assert_eq!(get_string_option(&options, "title"), None);
    }
}
