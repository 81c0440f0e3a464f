//! Ordered parser strategies that turn a model reply (or the raw request) into a page list

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::PageList;
use super::literal::{LiteralError, parse_list_literal};

/// Phrase that introduces the requested pages
pub const TRIGGER_PHRASE: &str = "please index:";

/// First bracketed span in a reply
static EMBEDDED_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("embedded list pattern is valid"));

/// One way of recovering a page list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The whole reply is a list literal
    ListLiteral,
    /// A list literal embedded in surrounding prose
    EmbeddedListLiteral,
    /// Comma-split the request text after the trigger phrase
    TriggerSplit,
}

impl Strategy {
    /// Strategies in the order they are tried
    pub const CHAIN: [Strategy; 3] = [Self::ListLiteral, Self::EmbeddedListLiteral, Self::TriggerSplit];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListLiteral => "list-literal",
            Self::EmbeddedListLiteral => "embedded-list-literal",
            Self::TriggerSplit => "trigger-split",
        }
    }

    /// Try this strategy
    ///
    /// `request` is the lower-cased user input; `reply` is the model's text,
    /// or `None` when the model call failed.
    pub fn attempt(&self, request: &str, reply: Option<&str>) -> Outcome {
        match self {
            Self::ListLiteral => {
                let Some(reply) = reply else {
                    return Outcome::Miss(Miss::NoReply);
                };
                let trimmed = reply.trim();
                if !is_bracketed(trimmed) {
                    return Outcome::Miss(Miss::NotBracketed);
                }
                literal_outcome(trimmed)
            }
            Self::EmbeddedListLiteral => {
                let Some(reply) = reply else {
                    return Outcome::Miss(Miss::NoReply);
                };
                let trimmed = reply.trim();
                if is_bracketed(trimmed) {
                    return Outcome::Miss(Miss::Bracketed);
                }
                match EMBEDDED_LIST.find(trimmed) {
                    Some(m) => literal_outcome(m.as_str()),
                    None => Outcome::Miss(Miss::NoBracketedSpan),
                }
            }
            Self::TriggerSplit => match request.find(TRIGGER_PHRASE) {
                Some(pos) => {
                    let rest = &request[pos + TRIGGER_PHRASE.len()..];
                    Outcome::Parsed(PageList::new(rest.split(',')))
                }
                None => Outcome::Miss(Miss::NoTrigger),
            },
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Tagged result of one strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Parsed(PageList),
    Miss(Miss),
}

/// Why a strategy did not produce a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Miss {
    /// The model call failed, so there is no reply to parse
    NoReply,
    NotBracketed,
    /// Fully bracketed replies belong to `ListLiteral`
    Bracketed,
    NoBracketedSpan,
    Literal(LiteralError),
    NoTrigger,
}

impl std::fmt::Display for Miss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoReply => write!(f, "no model reply"),
            Self::NotBracketed => write!(f, "reply is not a bracketed list"),
            Self::Bracketed => write!(f, "reply is fully bracketed"),
            Self::NoBracketedSpan => write!(f, "no bracketed span in reply"),
            Self::Literal(e) => write!(f, "literal parse failed: {}", e),
            Self::NoTrigger => write!(f, "trigger phrase not present"),
        }
    }
}

fn is_bracketed(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']')
}

fn literal_outcome(text: &str) -> Outcome {
    match parse_list_literal(text) {
        Ok(items) => Outcome::Parsed(PageList::new(items)),
        Err(e) => Outcome::Miss(Miss::Literal(e)),
    }
}

/// Run the chain left to right, stopping at the first parsed list
///
/// Returns the winning strategy, or `None` with an empty list when every
/// strategy missed.
pub fn run_chain(request: &str, reply: Option<&str>) -> (Option<Strategy>, PageList) {
    for strategy in Strategy::CHAIN {
        match strategy.attempt(request, reply) {
            Outcome::Parsed(pages) => {
                debug!(strategy = %strategy, page_count = pages.len(), "run_chain: parsed");
                return (Some(strategy), pages);
            }
            Outcome::Miss(miss) => {
                debug!(strategy = %strategy, reason = %miss, "run_chain: miss");
            }
        }
    }
    debug!("run_chain: every strategy missed");
    (None, PageList::default())
}
