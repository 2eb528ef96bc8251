//! The sanitized service name type.

use crate::NamingError;

/// Longest name the platform accepts (DNS-1035 label limit).
pub const MAX_NAME_LEN: usize = 63;

/// A service name that satisfies the platform naming rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceName(String);

impl ServiceName {
    /// Derives a service name from an arbitrary function name.
    ///
    /// Valid names pass through untouched. Anything else has ASCII uppercase
    /// folded to lowercase, `-` doubled and `.` replaced by `-`, and the
    /// result must then be a valid name.
    ///
    /// The mapping is not injective: `a.b` and `a-b` both yield `a-b`, and
    /// `MyFunc` yields the same name as `myfunc`. Character errors report the
    /// position in `raw`.
    pub fn sanitize(raw: &str) -> Result<Self, NamingError> {
        if raw.is_empty() {
            return Err(NamingError::Empty);
        }

        if validate(raw).is_ok() {
            return Ok(Self(raw.to_string()));
        }

        if let Some((position, character)) = raw.chars().enumerate().find(|(_, c)| {
            let c = c.to_ascii_lowercase();
            !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
        }) {
            return Err(NamingError::InvalidCharacter {
                name: raw.to_string(),
                character,
                position,
            });
        }

        let mut escaped = String::with_capacity(raw.len() + 8);
        for c in raw.chars() {
            match c {
                '-' => escaped.push_str("--"),
                '.' => escaped.push('-'),
                c => escaped.push(c.to_ascii_lowercase()),
            }
        }

        validate(&escaped)?;
        Ok(Self(escaped))
    }

    /// Parses a name that must already be valid.
    pub fn parse(s: &str) -> Result<Self, NamingError> {
        validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

fn validate(name: &str) -> Result<(), NamingError> {
    if name.is_empty() {
        return Err(NamingError::Empty);
    }

    if let Some((position, character)) = name
        .chars()
        .enumerate()
        .find(|(_, c)| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(NamingError::InvalidCharacter {
            name: name.to_string(),
            character,
            position,
        });
    }

    // Only ASCII is left at this point, so byte length equals char count.
    if name.len() > MAX_NAME_LEN {
        return Err(NamingError::TooLong {
            name: name.to_string(),
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }

    let bytes = name.as_bytes();
    if !bytes[0].is_ascii_lowercase() {
        return Err(NamingError::InvalidStart {
            name: name.to_string(),
        });
    }

    let last = bytes[bytes.len() - 1];
    if !(last.is_ascii_lowercase() || last.is_ascii_digit()) {
        return Err(NamingError::InvalidEnd {
            name: name.to_string(),
        });
    }

    Ok(())
}

impl std::fmt::Display for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ServiceName {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for ServiceName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ServiceName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
