//! Command Parsing
//!
//! Turns one text line into a [`Command`], enforcing each verb's arity.

use chrono::TimeDelta;

use crate::error::ProtocolError;
use crate::protocol::parse_duration;

// == Command ==
/// A parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `get <key>`
    Get { key: String },
    /// `set <key> <value> <ttl>`
    Set {
        key: String,
        value: String,
        ttl: TimeDelta,
    },
    /// `del <key>`
    Del { key: String },
    /// `stats`
    Stats,
    /// `quit`
    Quit,
}

impl Command {
    // == Parse ==
    /// Parses a line. Surrounding whitespace is ignored and the verb is
    /// case-insensitive. A blank line yields `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ProtocolError> {
        let params: Vec<&str> = line.split_whitespace().collect();
        let Some(verb) = params.first() else {
            return Ok(None);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "get" => {
                let [_, key] = params.as_slice() else {
                    return Err(ProtocolError::Arity("GET"));
                };
                Command::Get { key: key.to_string() }
            }
            "set" => {
                let [_, key, value, ttl] = params.as_slice() else {
                    return Err(ProtocolError::Arity("SET"));
                };
                let ttl = parse_duration(ttl).ok_or(ProtocolError::InvalidTtl)?;
                Command::Set {
                    key: key.to_string(),
                    value: value.to_string(),
                    ttl,
                }
            }
            "del" => {
                let [_, key] = params.as_slice() else {
                    return Err(ProtocolError::Arity("DEL"));
                };
                Command::Del { key: key.to_string() }
            }
            "stats" if params.len() == 1 => Command::Stats,
            "stats" => return Err(ProtocolError::Arity("STATS")),
            "quit" if params.len() == 1 => Command::Quit,
            "quit" => return Err(ProtocolError::Arity("QUIT")),
            _ => return Err(ProtocolError::InvalidCommand(verb.to_string())),
        };

        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("  \t\r\n"), Ok(None));
    }

    #[test]
    fn test_parse_get_del() {
        assert_eq!(
            Command::parse("get a\n"),
            Ok(Some(Command::Get { key: "a".to_string() }))
        );
        assert_eq!(
            Command::parse("  del   a  "),
            Ok(Some(Command::Del { key: "a".to_string() }))
        );
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            Command::parse("set a 1 10s\r\n"),
            Ok(Some(Command::Set {
                key: "a".to_string(),
                value: "1".to_string(),
                ttl: TimeDelta::seconds(10),
            }))
        );
    }

    #[test]
    fn test_parse_verb_case_insensitive() {
        assert_eq!(Command::parse("STATS"), Ok(Some(Command::Stats)));
        assert_eq!(Command::parse("Quit"), Ok(Some(Command::Quit)));
        assert!(matches!(Command::parse("GeT k"), Ok(Some(Command::Get { .. }))));
    }

    #[test]
    fn test_parse_wrong_arity() {
        assert_eq!(Command::parse("get"), Err(ProtocolError::Arity("GET")));
        assert_eq!(Command::parse("get a b"), Err(ProtocolError::Arity("GET")));
        assert_eq!(Command::parse("set a 1"), Err(ProtocolError::Arity("SET")));
        assert_eq!(Command::parse("del"), Err(ProtocolError::Arity("DEL")));
        assert_eq!(Command::parse("stats now"), Err(ProtocolError::Arity("STATS")));
        assert_eq!(Command::parse("quit please"), Err(ProtocolError::Arity("QUIT")));
    }

    #[test]
    fn test_parse_bad_ttl() {
        assert_eq!(Command::parse("set a 1 soon"), Err(ProtocolError::InvalidTtl));
        assert_eq!(Command::parse("set a 1 10"), Err(ProtocolError::InvalidTtl));
    }

    #[test]
    fn test_parse_unknown_verb() {
        assert_eq!(
            Command::parse("flush all"),
            Err(ProtocolError::InvalidCommand("flush".to_string()))
        );
    }
}
