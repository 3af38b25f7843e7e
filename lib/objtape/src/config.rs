use toml::{Table, Value};

/// Leader length for the first file of a library, and trailer length of the
/// last one.
pub const LONG_LEADER: usize = 150;

/// Leader length between files of a library.
pub const SHORT_LEADER: usize = 30;

/// Framing policy applied when assembling a library.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LibraryPolicy {
    /// Blank frames before the first file and after the last one.
    pub long_leader: usize,

    /// Blank frames before every file but the first one.
    pub short_leader: usize,
}

impl Default for LibraryPolicy {
    fn default() -> Self {
        Self {
            long_leader: LONG_LEADER,
            short_leader: SHORT_LEADER,
        }
    }
}

// Returns the frame count stored in `value` for the given `key`.
fn frame_count(key: &str, value: &Value) -> Result<usize, String> {
    match value {
        Value::Integer(n) if *n < 0 => Err(format!("'{}' cannot be negative", key)),
        Value::Integer(n) => {
            usize::try_from(*n).map_err(|_| format!("'{}' is too big ({})", key, n))
        }
        _ => Err(format!("'{}' must be an integer", key)),
    }
}

/// Parse the given blob of `text` as a TOML configuration for the library
/// assembler. Values which are not given fall back to the default policy.
pub fn parse_policy(text: &str) -> Result<LibraryPolicy, String> {
    let table = text.parse::<Table>().map_err(|e| e.message().to_string())?;
    let mut policy = LibraryPolicy::default();

    for (section, values) in &table {
        if section != "library" {
            return Err(format!("unknown section '{}'", section));
        }
        let Value::Table(values) = values else {
            return Err("'library' must be a table".to_string());
        };

        for (key, value) in values {
            match key.as_str() {
                "long_leader" => policy.long_leader = frame_count(key, value)?,
                "short_leader" => policy.short_leader = frame_count(key, value)?,
                _ => return Err(format!("unknown key '{}' in section 'library'", key)),
            }
        }
    }

    Ok(policy)
}
