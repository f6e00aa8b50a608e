use repochat_core::Msg;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  load <repository url>        ingest a repository and follow its progress
  cancel                       close the progress stream and reset
  refresh                      reload the project list
  open <project>               open a project chat
  close <project>              close a project chat (its transcript is discarded)
  ask <project> <question>     ask a question about a project
  status                       print the current state
  help                         print this help
  quit                         exit";

/// Everything the client loop reacts to, from the terminal or the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Msg(Msg),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command {0:?}, type `help` for a list")]
    Unknown(String),
    #[error("`{command}` needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

/// Parses one terminal line. Blank lines yield `None`.
///
/// Empty URLs and questions are passed through on purpose: rejecting them
/// with a validation message is the core's job.
pub fn parse_line(line: &str) -> Result<Option<Input>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (command, rest) = split_word(line);

    let input = match command {
        "load" => Input::Msg(Msg::IngestSubmitted {
            url: rest.to_string(),
        }),
        "cancel" | "reset" => Input::Msg(Msg::CancelClicked),
        "refresh" | "list" => Input::Msg(Msg::RefreshClicked),
        "open" => Input::Msg(Msg::ProjectOpened {
            project: required(rest, "open", "project name")?.to_string(),
        }),
        "close" => Input::Msg(Msg::ProjectClosed {
            project: required(rest, "close", "project name")?.to_string(),
        }),
        "ask" => {
            let (project, question) = split_word(rest);
            Input::Msg(Msg::ChatSubmitted {
                project: required(project, "ask", "project name")?.to_string(),
                text: question.to_string(),
            })
        }
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(input))
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

fn required<'a>(
    value: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, CommandError> {
    if value.is_empty() {
        Err(CommandError::MissingArgument { command, argument })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ingestion_commands() {
        assert_eq!(
            parse_line("load  https://github.com/x/y ").unwrap(),
            Some(Input::Msg(Msg::IngestSubmitted {
                url: "https://github.com/x/y".to_string()
            }))
        );
        assert_eq!(
            parse_line("load").unwrap(),
            Some(Input::Msg(Msg::IngestSubmitted { url: String::new() }))
        );
        assert_eq!(
            parse_line("cancel").unwrap(),
            Some(Input::Msg(Msg::CancelClicked))
        );
    }

    #[test]
    fn ask_keeps_the_whole_question() {
        assert_eq!(
            parse_line("ask p1 what does this repo do?").unwrap(),
            Some(Input::Msg(Msg::ChatSubmitted {
                project: "p1".to_string(),
                text: "what does this repo do?".to_string(),
            }))
        );
    }

    #[test]
    fn missing_project_is_reported() {
        assert_eq!(
            parse_line("ask").unwrap_err(),
            CommandError::MissingArgument {
                command: "ask",
                argument: "project name"
            }
        );
        assert!(parse_line("open   ").is_err());
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(
            parse_line("dance now").unwrap_err(),
            CommandError::Unknown("dance".to_string())
        );
        assert_eq!(parse_line("quit").unwrap(), Some(Input::Quit));
    }
}
