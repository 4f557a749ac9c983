#![forbid(unsafe_code)]

mod directive;
mod invariant;
mod model;
mod range;

pub use directive::*;
pub use invariant::*;
pub use model::*;
pub use range::*;

pub mod ids {
    /// Scope key for one independent hierarchy sharing storage with others.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct TreeId(String);

    impl TreeId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
            let value = value.into();
            validate_tree_id(&value)?;
            Ok(Self(value))
        }
    }

    impl std::fmt::Display for TreeId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct NodeId(i64);

    impl NodeId {
        pub fn try_new(value: i64) -> Result<Self, IdError> {
            if value <= 0 {
                return Err(IdError::NotPositive);
            }
            Ok(Self(value))
        }

        pub fn get(self) -> i64 {
            self.0
        }
    }

    impl std::fmt::Display for NodeId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum IdError {
        Empty,
        TooLong,
        InvalidFirstChar,
        InvalidChar { ch: char, index: usize },
        NotPositive,
    }

    impl std::fmt::Display for IdError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Empty => write!(f, "id must not be empty"),
                Self::TooLong => write!(f, "id must be at most 128 characters"),
                Self::InvalidFirstChar => write!(f, "id must start with an ascii letter or digit"),
                Self::InvalidChar { ch, index } => {
                    write!(f, "invalid character {ch:?} at index {index}")
                }
                Self::NotPositive => write!(f, "node id must be positive"),
            }
        }
    }

    impl std::error::Error for IdError {}

    fn validate_tree_id(value: &str) -> Result<(), IdError> {
        if value.is_empty() {
            return Err(IdError::Empty);
        }
        if value.len() > 128 {
            return Err(IdError::TooLong);
        }
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return Err(IdError::Empty);
        };
        if !first.is_ascii_alphanumeric() {
            return Err(IdError::InvalidFirstChar);
        }
        for (index, ch) in value.chars().enumerate() {
            if index == 0 {
                continue;
            }
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '/' | '-') {
                continue;
            }
            return Err(IdError::InvalidChar { ch, index });
        }
        Ok(())
    }
}
