//! Classification of the raw text a user types into the login username field.
//!
//! Rules run in a fixed order and the first one that claims the input wins:
//! qualified account id (`@local:server`), then email address, then plain
//! username. A leading `@` commits the input to the account-id rule, so a
//! malformed account id is reported instead of being retried as a username.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex should compile")
});

const ACCOUNT_ID_SIGIL: char = '@';
const ACCOUNT_ID_SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    LocalUsername(String),
    QualifiedAccountId { local_part: String, server: String },
    EmailAddress(String),
}

impl Identifier {
    pub fn kind(&self) -> IdentifierKind {
        match self {
            Self::LocalUsername(_) => IdentifierKind::LocalUsername,
            Self::QualifiedAccountId { .. } => IdentifierKind::QualifiedAccountId,
            Self::EmailAddress(_) => IdentifierKind::EmailAddress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    LocalUsername,
    QualifiedAccountId,
    EmailAddress,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LocalUsername => "username",
            Self::QualifiedAccountId => "account id",
            Self::EmailAddress => "email",
        };
        f.write_str(label)
    }
}

/// The part of an `@local:server` identifier that could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPart {
    LocalPart,
    Server,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier must not be empty")]
    Empty,
    #[error("malformed account id '{raw}': missing {missing:?}")]
    MalformedAccountId { raw: String, missing: MissingPart },
}

/// Outcome of a single rule: either it claims the input (successfully or
/// not) or it passes the input on to the next rule.
enum RuleOutcome {
    Claimed(Result<Identifier, IdentifierError>),
    Pass,
}

type Rule = fn(&str) -> RuleOutcome;

const RULES: [Rule; 3] = [qualified_account_id_rule, email_rule, local_username_rule];

/// Classifies `raw` after trimming surrounding whitespace.
pub fn classify(raw: &str) -> Result<Identifier, IdentifierError> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(IdentifierError::Empty);
    }

    for rule in RULES {
        if let RuleOutcome::Claimed(result) = rule(input) {
            return result;
        }
    }

    // local_username_rule claims every non-empty input
    Ok(Identifier::LocalUsername(input.to_string()))
}

fn qualified_account_id_rule(input: &str) -> RuleOutcome {
    let Some(rest) = input.strip_prefix(ACCOUNT_ID_SIGIL) else {
        return RuleOutcome::Pass;
    };

    let malformed = |missing| {
        RuleOutcome::Claimed(Err(IdentifierError::MalformedAccountId {
            raw: input.to_string(),
            missing,
        }))
    };

    let Some((local_part, server)) = rest.split_once(ACCOUNT_ID_SEPARATOR) else {
        return malformed(MissingPart::Separator);
    };
    if local_part.is_empty() || local_part.chars().any(char::is_whitespace) {
        return malformed(MissingPart::LocalPart);
    }
    if server.is_empty() || server.chars().any(char::is_whitespace) {
        return malformed(MissingPart::Server);
    }

    RuleOutcome::Claimed(Ok(Identifier::QualifiedAccountId {
        local_part: local_part.to_string(),
        server: server.to_string(),
    }))
}

fn email_rule(input: &str) -> RuleOutcome {
    if EMAIL_REGEX.is_match(input) {
        RuleOutcome::Claimed(Ok(Identifier::EmailAddress(input.to_string())))
    } else {
        RuleOutcome::Pass
    }
}

fn local_username_rule(input: &str) -> RuleOutcome {
    RuleOutcome::Claimed(Ok(Identifier::LocalUsername(input.to_string())))
}

#[cfg(test)]
#[path = "tests/identifier_tests.rs"]
mod tests;
