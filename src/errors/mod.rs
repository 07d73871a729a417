use crate::frontend::config::ErrorValue;
use crate::interop::{ConversionError, DispatchError, DynamicValue};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NameNotFound,
    NotCallable,
    CallFailed,
    UnsupportedShape,
    CyclicStructure,
    NumericOverflow,
}

impl ErrorKind {
    /// Stable code reported to the UI layer
    pub const fn code(self) -> &'static str {
        match self {
            Self::NameNotFound => "NameNotFound",
            Self::NotCallable => "NotCallable",
            Self::CallFailed => "CallFailed",
            Self::UnsupportedShape => "UnsupportedShape",
            Self::CyclicStructure => "CyclicStructure",
            Self::NumericOverflow => "NumericOverflow",
        }
    }

    /// True for failures on the result path, after the callee returned
    pub const fn is_conversion(self) -> bool {
        matches!(
            self,
            Self::UnsupportedShape | Self::CyclicStructure | Self::NumericOverflow
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedShape { .. } => ErrorKind::UnsupportedShape,
            Self::CyclicStructure { .. } => ErrorKind::CyclicStructure,
            Self::NumericOverflow { .. } => ErrorKind::NumericOverflow,
        }
    }
}

/// Failure of one bridge call, as surfaced to the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeError {
    pub kind: ErrorKind,
    pub function: String,
    pub description: String,
    pub suggestions: Vec<String>,
}

impl BridgeError {
    pub fn new(kind: ErrorKind, function: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            function: function.into(),
            description: description.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn from_dispatch(error: DispatchError) -> Self {
        let kind = error.kind();
        let description = error.to_string();
        match error {
            DispatchError::NameNotFound { name, suggestions } => {
                Self::new(kind, name, description).with_suggestions(suggestions)
            }
            DispatchError::NotCallable { name, .. } | DispatchError::CallFailed { name, .. } => {
                Self::new(kind, name, description)
            }
        }
    }

    pub fn from_conversion(function: &str, error: ConversionError) -> Self {
        Self::new(error.kind(), function, error.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Value handed back to the UI layer in place of a result
    pub fn to_dynamic(&self, policy: ErrorValue) -> DynamicValue {
        match policy {
            ErrorValue::Null => DynamicValue::Null,
            ErrorValue::Message => {
                DynamicValue::String(format!("{}: {}", self.kind, self.description))
            }
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.description)?;

        for suggestion in &self.suggestions {
            write!(f, "\n  hint: did you mean '{}'?", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for BridgeError {}

/// Compute Levenshtein distance for "did you mean" suggestions
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() { return b_chars.len(); }
    if b_chars.is_empty() { return a_chars.len(); }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut row = vec![0; b_chars.len() + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut row);
    }

    prev[b_chars.len()]
}

/// Names within `max_distance` of `target`, closest first
pub fn find_similar_names(target: &str, candidates: &[String], max_distance: usize) -> Vec<String> {
    let mut results: Vec<(&String, usize)> = candidates
        .iter()
        .map(|c| (c, levenshtein_distance(target, c)))
        .filter(|(_, dist)| *dist <= max_distance && *dist > 0)
        .collect();

    results.sort_by(|(a, da), (b, db)| da.cmp(db).then_with(|| a.cmp(b)));
    results.into_iter().map(|(name, _)| name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::ValuePath;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("greet", "greet"), 0);
        assert_eq!(levenshtein_distance("gret", "greet"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_similar_names_ordered_by_distance() {
        let names: Vec<String> = ["add", "addx", "sub", "ad"].iter().map(|s| s.to_string()).collect();
        assert_eq!(find_similar_names("adx", &names, 1), vec!["ad", "add", "addx"]);
        assert!(find_similar_names("multiply", &names, 2).is_empty());
    }

    #[test]
    fn test_from_dispatch_keeps_suggestions() {
        let err = BridgeError::from_dispatch(DispatchError::NameNotFound {
            name: "gret".into(),
            suggestions: vec!["greet".into()],
        });
        assert_eq!(err.kind(), ErrorKind::NameNotFound);
        assert_eq!(err.function, "gret");
        assert_eq!(err.suggestions, vec!["greet".to_string()]);
        assert!(err.to_string().contains("hint: did you mean 'greet'?"));
    }

    #[test]
    fn test_error_value_policy() {
        let err = BridgeError::from_conversion(
            "make",
            ConversionError::CyclicStructure { path: ValuePath::root() },
        );
        assert!(err.kind().is_conversion());
        assert_eq!(err.to_dynamic(ErrorValue::Null), DynamicValue::Null);
        assert_eq!(
            err.to_dynamic(ErrorValue::Message),
            DynamicValue::String("CyclicStructure: list at $ contains itself".into())
        );
    }
}
