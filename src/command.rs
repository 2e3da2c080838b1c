use crate::{error::RelayError, filter::FilterKind, request::Method};

pub const COMMAND_SIGIL: char = '!';
pub const CONTEXT_MARKER: char = '*';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand<'a> {
    List,
    Delete(&'a str),
    Set { key: &'a str, value: &'a str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Empty,
    Help,
    Config(ConfigCommand<'a>),
    Markers(bool),
    Connectivity,
    Reset,
    Target { method: Method, url: &'a str },
    Header(&'a str),
    Body(&'a str),
    Filter(&'a str),
    Send,
    Show,
    Clear,
    Unknown(&'a str),
    Context(&'a str),
    Content(&'a str),
}

impl<'a> Command<'a> {
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if let Some(command) = line.strip_prefix(COMMAND_SIGIL) {
            return Self::parse_command(command);
        }
        if line.len() > 1
            && let Some(context) = line.strip_suffix(CONTEXT_MARKER)
        {
            return Self::Context(context);
        }
        Self::Content(line)
    }

    fn parse_command(command: &'a str) -> Self {
        match command {
            "HELP" => return Self::Help,
            "NET" | "WIFI" => return Self::Connectivity,
            "RESET" => return Self::Reset,
            "SEND" => return Self::Send,
            "REQUEST" => return Self::Show,
            "CLEAR" => return Self::Clear,
            "SET" => return Self::Config(ConfigCommand::List),
            _ => {}
        }

        if let Some(args) = command.strip_prefix("SET ") {
            return Self::Config(match args.split_once(' ') {
                Some((key, value)) => ConfigCommand::Set { key, value },
                None => ConfigCommand::Delete(args),
            });
        }
        if let Some(arg) = command.strip_prefix("MARKERS ") {
            return Self::Markers(arg.trim() == "ON");
        }

        let methods = [
            ("GET ", Method::Get),
            ("PUT ", Method::Put),
            ("POST ", Method::Post),
        ];
        for (prefix, method) in methods {
            if let Some(url) = command.strip_prefix(prefix) {
                return Self::Target { method, url };
            }
        }

        if let Some(header) = command.strip_prefix("HEAD ") {
            return Self::Header(header);
        }
        if let Some(body) = command.strip_prefix("BODY ") {
            return Self::Body(body);
        }
        if let Some(filter) = command.strip_prefix("FILTER ") {
            return Self::Filter(filter);
        }
        Self::Unknown(command)
    }
}

/// Splits `key:value` at the first colon and trims both halves.
///
/// # Errors
/// `MalformedHeader` without a colon or with an empty key.
pub fn split_header(raw: &str) -> Result<(&str, &str), RelayError> {
    match raw.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(RelayError::MalformedHeader),
    }
}

#[must_use]
pub fn help_lines() -> Vec<String> {
    let filters = FilterKind::ALL
        .iter()
        .map(|kind| kind.name())
        .collect::<Vec<_>>()
        .join(", ");
    vec![
        ">HELP".to_string(),
        "!SET [<key> [<value>]] - List, delete or set configuration values".to_string(),
        "!MARKERS <ON|OFF> - Enable/disable response markers".to_string(),
        "!NET - Check network connectivity".to_string(),
        "!RESET - Restart the relay session".to_string(),
        "!GET <url> - Set method and URL".to_string(),
        "!PUT <url> - Set method and URL".to_string(),
        "!POST <url> - Set method and URL".to_string(),
        "!HEAD <key>:<value> - Add HTTP header".to_string(),
        "!BODY <body> - Set request body (@CTX@ and @CNT@ are replaced on send)".to_string(),
        format!("!FILTER <filter> - Set output filter ({filters})"),
        "!SEND - Send the HTTP request".to_string(),
        "!REQUEST - Print current request configuration".to_string(),
        "!CLEAR - Clear current request configuration".to_string(),
        "<text>* - Set context".to_string(),
        "<text> - Set content and send".to_string(),
    ]
}
