use std::fmt;

/// Error codes for all type-checker diagnostics.
///
/// Format: E#### where the first digit indicates the category:
/// - E1xxx: Resolution/scheduling errors
/// - E2xxx: Type errors
/// - E3xxx: Contextual-rule (scope) violations
/// - E4xxx: Declaration errors
/// - E5xxx: Control-flow errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Resolution Errors (E1xxx)
    /// Required name never became resolvable
    E1001,
    /// Definition depends on the name it itself publishes
    E1002,

    // Type Errors (E2xxx)
    /// Type mismatch
    E2001,
    /// Unknown type
    E2002,
    /// Unknown field
    E2003,
    /// Not callable / argument mismatch
    E2004,
    /// Cannot infer type
    E2005,
    /// Missing required field with no declared default
    E2006,
    /// Not indexable
    E2007,
    /// Unknown enum variant
    E2008,

    // Scope Violations (E3xxx)
    /// Mutation inside a read-only boundary
    E3001,
    /// Non-pure call from a pure scope
    E3002,
    /// Abort or abortable call outside an abortable scope
    E3003,
    /// Remote service call without a reachable cache
    E3004,
    /// Viewer field access outside a viewer scope
    E3005,
    /// Expression illegal in this compute context
    E3006,

    // Declaration Errors (E4xxx)
    /// Duplicate declaration
    E4001,

    // Control Flow Errors (E5xxx)
    /// Body can fall through without returning a value
    E5001,
}

impl ErrorCode {
    /// The code as displayed to users, e.g. `"E2001"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::E3005 => "E3005",
            ErrorCode::E3006 => "E3006",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E5001 => "E5001",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_variant() {
        assert_eq!(ErrorCode::E2001.to_string(), "E2001");
        assert_eq!(ErrorCode::E3002.as_str(), "E3002");
    }
}
