use crate::error::{Result, SmtpError};

/// The implemented command set.
///
/// Dispatch is a static lookup over this closed enumeration; any verb
/// outside it is answered with `502`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Helo,
    Noop,
    Quit,
    Mail,
    Rcpt,
    Rset,
    Data,
}

impl Verb {
    fn lookup(verb: &str) -> Option<Self> {
        match verb.to_ascii_uppercase().as_str() {
            "HELO" => Some(Verb::Helo),
            "NOOP" => Some(Verb::Noop),
            "QUIT" => Some(Verb::Quit),
            "MAIL" => Some(Verb::Mail),
            "RCPT" => Some(Verb::Rcpt),
            "RSET" => Some(Verb::Rset),
            "DATA" => Some(Verb::Data),
            _ => None,
        }
    }
}

/// One parsed command line: a verb and its optional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub arg: Option<String>,
}

impl Command {
    /// Parses a command line already stripped of its CRLF.
    ///
    /// The line is split on the first space; the remainder, trimmed, is the
    /// argument (`None` when absent or blank). An empty or all-whitespace
    /// line is a distinguished syntax error, not an unknown command.
    pub fn parse(line: &str) -> Result<Self> {
        if line.trim().is_empty() {
            return Err(SmtpError::Unrecognised);
        }

        let (verb, arg) = match line.find(' ') {
            Some(i) => (line[..i].trim(), line[i + 1..].trim()),
            None => (line.trim(), ""),
        };

        let verb = match Verb::lookup(verb) {
            Some(v) => v,
            None => return Err(SmtpError::NotImplemented(verb.to_string())),
        };
        let arg = if arg.is_empty() {
            None
        } else {
            Some(arg.to_string())
        };

        Ok(Command { verb, arg })
    }
}

/// Extracts the address from a `FROM:`/`TO:` style argument.
///
/// The keyword prefix is matched case-insensitively and the remainder is
/// trimmed. Angle brackets are stripped from `<person@example.com>` forms,
/// but the null reverse-path `<>` is kept verbatim. Returns `None` when the
/// keyword is missing or nothing follows it.
pub fn extract_address<'a>(keyword: &str, arg: &'a str) -> Option<&'a str> {
    let prefix = arg.get(..keyword.len())?;
    if !prefix.eq_ignore_ascii_case(keyword) {
        return None;
    }

    let address = arg[keyword.len()..].trim();
    if address.is_empty() {
        return None;
    }
    if address.starts_with('<') && address.ends_with('>') && address != "<>" {
        Some(&address[1..address.len() - 1])
    } else {
        Some(address)
    }
}
