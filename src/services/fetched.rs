use std::fmt::Display;

/// Why an external call produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absence {
    /// The request exceeded its timeout
    Timeout,
    /// Connection, TLS or protocol failure
    Transport,
    /// The service answered with a non-success status
    Status(u16),
    /// The service answered but the body was empty or unusable
    NoData,
}

impl Display for Absence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Absence::Timeout => write!(f, "timeout"),
            Absence::Transport => write!(f, "transport error"),
            Absence::Status(code) => write!(f, "status {}", code),
            Absence::NoData => write!(f, "no data"),
        }
    }
}

/// Result of an external call that degrades instead of failing
///
/// Callers that only care about the data use [`Fetched::unwrap_or_default`];
/// the reason stays available for those that need to tell "nothing found"
/// from "service unreachable".
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Data(T),
    Absent(Absence),
}

impl<T> Fetched<T> {
    pub fn data(self) -> Option<T> {
        match self {
            Fetched::Data(value) => Some(value),
            Fetched::Absent(_) => None,
        }
    }

    pub fn absence(&self) -> Option<Absence> {
        match self {
            Fetched::Data(_) => None,
            Fetched::Absent(reason) => Some(*reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Data(value) => Fetched::Data(f(value)),
            Fetched::Absent(reason) => Fetched::Absent(reason),
        }
    }
}

impl<T: Default> Fetched<T> {
    pub fn unwrap_or_default(self) -> T {
        self.data().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_defaults_to_empty() {
        let fetched: Fetched<Vec<String>> = Fetched::Absent(Absence::Timeout);
        assert_eq!(fetched.absence(), Some(Absence::Timeout));
        assert!(fetched.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_map_keeps_reason() {
        let fetched: Fetched<u8> = Fetched::Absent(Absence::Status(503));
        assert_eq!(fetched.map(|v| v * 2), Fetched::Absent(Absence::Status(503)));
        assert_eq!(Fetched::Data(2u8).map(|v| v * 2).data(), Some(4));
    }

    #[test]
    fn test_absence_display() {
        assert_eq!(Absence::Status(429).to_string(), "status 429");
        assert_eq!(Absence::NoData.to_string(), "no data");
    }
}
