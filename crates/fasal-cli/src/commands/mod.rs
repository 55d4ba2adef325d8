//! Slash commands for interactive mode

/// Result of executing a slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Copy an assistant reply; `None` means the latest
    Copy(Option<usize>),
    /// Show the example questions
    Examples,
    /// Show a message to the user (not sent to the endpoint)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "copy" | "y" => parse_copy(args),

        "examples" | "e" => CommandResult::Examples,

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

fn parse_copy(args: &str) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Copy(None);
    }
    match args.parse::<usize>() {
        Ok(n) if n > 0 => CommandResult::Copy(Some(n)),
        _ => CommandResult::Message("Usage: /copy [n]  (n counts replies from 1)".to_string()),
    }
}

pub fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /examples, /e        Show example questions
  /copy, /y [n]        Copy the latest reply, or reply n, to the clipboard
  /clear, /c           Clear conversation history
  /quit, /exit, /q     Exit fasal

Examples:
  /copy                Copy the latest reply
  /copy 2              Copy the second reply
  /clear               Start a fresh conversation"#
        .to_string()
}
