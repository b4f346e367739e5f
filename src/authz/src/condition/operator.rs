//! Condition operator names

use std::fmt;

/// Operator applied by a condition leaf
///
/// Parsing never fails: names outside the known set become [`Operator::Unknown`],
/// which always evaluates to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    // String
    StringEquals,
    StringNotEquals,
    StringEqualsIgnoreCase,
    StringLike,
    StringContains,
    StringStartsWith,
    StringEndsWith,
    StringRegex,

    // Numeric
    NumericEquals,
    NumericNotEquals,
    NumericLessThan,
    NumericLessThanEquals,
    NumericGreaterThan,
    NumericGreaterThanEquals,
    NumericBetween,

    // Boolean
    Bool,

    // Date and time
    DateGreaterThan,
    DateLessThan,
    DateBetween,
    DayOfWeek,
    TimeOfDay,
    IsBusinessHours,

    // Array
    ArrayContains,
    ArrayNotContains,
    ArraySize,

    // Network
    IpInRange,
    IpNotInRange,
    IsInternalIp,

    /// Unrecognized operator name
    Unknown(String),
}

impl Operator {
    /// Parse an operator name as written in a policy document
    pub fn parse(name: &str) -> Self {
        match name {
            "StringEquals" => Self::StringEquals,
            "StringNotEquals" => Self::StringNotEquals,
            "StringEqualsIgnoreCase" => Self::StringEqualsIgnoreCase,
            "StringLike" => Self::StringLike,
            "StringContains" => Self::StringContains,
            "StringStartsWith" => Self::StringStartsWith,
            "StringEndsWith" => Self::StringEndsWith,
            "StringRegex" => Self::StringRegex,
            "NumericEquals" => Self::NumericEquals,
            "NumericNotEquals" => Self::NumericNotEquals,
            "NumericLessThan" => Self::NumericLessThan,
            "NumericLessThanEquals" => Self::NumericLessThanEquals,
            "NumericGreaterThan" => Self::NumericGreaterThan,
            "NumericGreaterThanEquals" => Self::NumericGreaterThanEquals,
            "NumericBetween" => Self::NumericBetween,
            "Bool" => Self::Bool,
            "DateGreaterThan" => Self::DateGreaterThan,
            "DateLessThan" => Self::DateLessThan,
            "DateBetween" => Self::DateBetween,
            "DayOfWeek" => Self::DayOfWeek,
            "TimeOfDay" => Self::TimeOfDay,
            "IsBusinessHours" => Self::IsBusinessHours,
            "ArrayContains" => Self::ArrayContains,
            "ArrayNotContains" => Self::ArrayNotContains,
            "ArraySize" => Self::ArraySize,
            "IPInRange" => Self::IpInRange,
            "IPNotInRange" => Self::IpNotInRange,
            "IsInternalIP" => Self::IsInternalIp,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Canonical policy-document name
    pub fn name(&self) -> &str {
        match self {
            Self::StringEquals => "StringEquals",
            Self::StringNotEquals => "StringNotEquals",
            Self::StringEqualsIgnoreCase => "StringEqualsIgnoreCase",
            Self::StringLike => "StringLike",
            Self::StringContains => "StringContains",
            Self::StringStartsWith => "StringStartsWith",
            Self::StringEndsWith => "StringEndsWith",
            Self::StringRegex => "StringRegex",
            Self::NumericEquals => "NumericEquals",
            Self::NumericNotEquals => "NumericNotEquals",
            Self::NumericLessThan => "NumericLessThan",
            Self::NumericLessThanEquals => "NumericLessThanEquals",
            Self::NumericGreaterThan => "NumericGreaterThan",
            Self::NumericGreaterThanEquals => "NumericGreaterThanEquals",
            Self::NumericBetween => "NumericBetween",
            Self::Bool => "Bool",
            Self::DateGreaterThan => "DateGreaterThan",
            Self::DateLessThan => "DateLessThan",
            Self::DateBetween => "DateBetween",
            Self::DayOfWeek => "DayOfWeek",
            Self::TimeOfDay => "TimeOfDay",
            Self::IsBusinessHours => "IsBusinessHours",
            Self::ArrayContains => "ArrayContains",
            Self::ArrayNotContains => "ArrayNotContains",
            Self::ArraySize => "ArraySize",
            Self::IpInRange => "IPInRange",
            Self::IpNotInRange => "IPNotInRange",
            Self::IsInternalIp => "IsInternalIP",
            Self::Unknown(name) => name,
        }
    }

    /// Whether this operator is recognized
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
