use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandLineError {
    #[error("empty command")]
    Empty,

    #[error("unterminated {quote} quote in command: {command}")]
    UnterminatedQuote { quote: char, command: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommandLine {
    pub program: String,
    pub args: Vec<String>,
}

/// Splits a command line on whitespace, grouping text inside single or double
/// quotes into one argument. Quotes do not nest and there is no escape
/// character; `''` yields an empty argument.
pub fn split_command_line(raw: &str) -> Result<Vec<String>, CommandLineError> {
    let mut parts: Vec<String> = vec![];
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in raw.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    parts.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if let Some(open) = quote {
        return Err(CommandLineError::UnterminatedQuote {
            quote: open,
            command: raw.trim().to_string(),
        });
    }
    if in_token {
        parts.push(current);
    }
    Ok(parts)
}

pub fn parse_command_line(raw: &str) -> Result<ParsedCommandLine, CommandLineError> {
    if raw.trim().is_empty() {
        return Err(CommandLineError::Empty);
    }
    let mut parts = split_command_line(raw)?.into_iter();
    let program = parts
        .next()
        .filter(|p| !p.is_empty())
        .ok_or(CommandLineError::Empty)?;
    Ok(ParsedCommandLine {
        program,
        args: parts.collect(),
    })
}
