//! Parses one line of the textual command grammar (§6) into a `Command`.
//! Parsing is purely syntactic — numeric ranges, id formats, and
//! cross-field rules belong to `validate`, not here.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTarget {
    All,
    Triage,
    Surgery,
    Pharmacy,
    Lab,
}

#[derive(Debug, Clone)]
pub enum Command {
    Shutdown,
    Status(StatusTarget),
    Emergency {
        id: String,
        init: u64,
        triage: u8,
        stability: i32,
        tests: Vec<String>,
        meds: Vec<String>,
    },
    Appointment {
        id: String,
        init: u64,
        scheduled: u64,
        doctor: String,
        tests: Vec<String>,
    },
    Surgery {
        id: String,
        init: u64,
        surgery_type: String,
        scheduled: u64,
        urgency: String,
        tests: Vec<String>,
        meds: Vec<String>,
    },
    PharmacyRequest {
        id: String,
        init: u64,
        priority: String,
        items: Vec<(String, u32)>,
    },
    LabRequest {
        id: String,
        init: u64,
        priority: String,
        lab: String,
        tests: Vec<String>,
    },
    Restock {
        medname: String,
        quantity: u32,
    },
    Help,
}

#[derive(Debug, Clone)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    MissingField(&'static str),
    BadNumber(&'static str),
    BadList(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty command line"),
            ParseError::UnknownCommand(cmd) => write!(f, "unknown command '{cmd}'"),
            ParseError::MissingField(name) => write!(f, "missing field '{name}'"),
            ParseError::BadNumber(name) => write!(f, "field '{name}' is not a valid number"),
            ParseError::BadList(name) => write!(f, "field '{name}' is not a valid list"),
        }
    }
}

impl std::error::Error for ParseError {}

fn strip_brackets(raw: &str) -> &str {
    raw.strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(raw)
}

fn parse_list(raw: &str) -> Vec<String> {
    let inner = strip_brackets(raw);
    if inner.is_empty() {
        return Vec::new();
    }
    inner.split(',').map(|s| s.trim().to_string()).collect()
}

fn parse_qty_list(raw: &str, field: &'static str) -> Result<Vec<(String, u32)>, ParseError> {
    let inner = strip_brackets(raw);
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|entry| {
            let (name, qty) = entry.split_once(':').ok_or(ParseError::BadList(field))?;
            let qty: u32 = qty.trim().parse().map_err(|_| ParseError::BadNumber(field))?;
            Ok((name.trim().to_string(), qty))
        })
        .collect()
}

/// Parses the `key:value` tokens following the command name (and, for
/// commands with a positional id, after that id) into a lookup map.
fn kv_map<'a>(tokens: &[&'a str]) -> HashMap<&'a str, &'a str> {
    tokens
        .iter()
        .filter_map(|tok| tok.split_once(':'))
        .collect()
}

fn req_str<'a>(kv: &HashMap<&'a str, &'a str>, key: &'static str) -> Result<&'a str, ParseError> {
    kv.get(key).copied().ok_or(ParseError::MissingField(key))
}

fn req_u64(kv: &HashMap<&str, &str>, key: &'static str) -> Result<u64, ParseError> {
    req_str(kv, key)?.parse().map_err(|_| ParseError::BadNumber(key))
}

fn req_i32(kv: &HashMap<&str, &str>, key: &'static str) -> Result<i32, ParseError> {
    req_str(kv, key)?.parse().map_err(|_| ParseError::BadNumber(key))
}

fn req_u8(kv: &HashMap<&str, &str>, key: &'static str) -> Result<u8, ParseError> {
    req_str(kv, key)?.parse().map_err(|_| ParseError::BadNumber(key))
}

pub fn parse(line: &str) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (head, rest) = tokens.split_first().ok_or(ParseError::Empty)?;

    match head.to_ascii_uppercase().as_str() {
        "SHUTDOWN" => Ok(Command::Shutdown),
        "HELP" => Ok(Command::Help),
        "STATUS" => {
            let target = rest.first().copied().unwrap_or("ALL");
            let target = match target.to_ascii_uppercase().as_str() {
                "ALL" => StatusTarget::All,
                "TRIAGE" => StatusTarget::Triage,
                "SURGERY" => StatusTarget::Surgery,
                "PHARMACY" => StatusTarget::Pharmacy,
                "LAB" => StatusTarget::Lab,
                other => return Err(ParseError::UnknownCommand(other.to_string())),
            };
            Ok(Command::Status(target))
        }
        "EMERGENCY" => {
            let (id, rest) = rest.split_first().ok_or(ParseError::MissingField("id"))?;
            let kv = kv_map(rest);
            Ok(Command::Emergency {
                id: id.to_string(),
                init: req_u64(&kv, "init")?,
                triage: req_u8(&kv, "triage")?,
                stability: req_i32(&kv, "stability")?,
                tests: kv.get("tests").map(|v| parse_list(v)).unwrap_or_default(),
                meds: kv.get("meds").map(|v| parse_list(v)).unwrap_or_default(),
            })
        }
        "APPOINTMENT" => {
            let (id, rest) = rest.split_first().ok_or(ParseError::MissingField("id"))?;
            let kv = kv_map(rest);
            Ok(Command::Appointment {
                id: id.to_string(),
                init: req_u64(&kv, "init")?,
                scheduled: req_u64(&kv, "scheduled")?,
                doctor: req_str(&kv, "doctor")?.to_string(),
                tests: kv.get("tests").map(|v| parse_list(v)).unwrap_or_default(),
            })
        }
        "SURGERY" => {
            let (id, rest) = rest.split_first().ok_or(ParseError::MissingField("id"))?;
            let kv = kv_map(rest);
            Ok(Command::Surgery {
                id: id.to_string(),
                init: req_u64(&kv, "init")?,
                surgery_type: req_str(&kv, "type")?.to_string(),
                scheduled: req_u64(&kv, "scheduled")?,
                urgency: req_str(&kv, "urgency")?.to_string(),
                tests: parse_list(req_str(&kv, "tests")?),
                meds: parse_list(req_str(&kv, "meds")?),
            })
        }
        "PHARMACY_REQUEST" => {
            let (id, rest) = rest.split_first().ok_or(ParseError::MissingField("id"))?;
            let kv = kv_map(rest);
            Ok(Command::PharmacyRequest {
                id: id.to_string(),
                init: req_u64(&kv, "init")?,
                priority: req_str(&kv, "priority")?.to_string(),
                items: parse_qty_list(req_str(&kv, "items")?, "items")?,
            })
        }
        "LAB_REQUEST" => {
            let (id, rest) = rest.split_first().ok_or(ParseError::MissingField("id"))?;
            let kv = kv_map(rest);
            Ok(Command::LabRequest {
                id: id.to_string(),
                init: req_u64(&kv, "init")?,
                priority: req_str(&kv, "priority")?.to_string(),
                lab: req_str(&kv, "lab")?.to_string(),
                tests: parse_list(req_str(&kv, "tests")?),
            })
        }
        "RESTOCK" => {
            let (medname, rest) = rest.split_first().ok_or(ParseError::MissingField("medname"))?;
            let kv = kv_map(rest);
            Ok(Command::Restock {
                medname: medname.to_string(),
                quantity: req_u64(&kv, "quantity")? as u32,
            })
        }
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}
