//! Closed string vocabularies shared with the remote service

use crate::error::{Result, ValidationError};

/// An enum whose variants map one-to-one onto fixed wire keywords.
pub trait Keyword: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn from_keyword(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == value)
    }

    /// Comma-separated list of accepted keywords, for error messages.
    fn supported() -> String {
        Self::ALL
            .iter()
            .map(Keyword::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn parse_field(field: &str, value: &str) -> Result<Self> {
        Self::from_keyword(value).ok_or_else(|| ValidationError::UnsupportedValue {
            field: field.to_string(),
            value: value.to_string(),
            supported: Self::supported(),
        })
    }
}

macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $kw:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::keyword::Keyword for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $kw),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::keyword::Keyword::as_str(self))
            }
        }
    };
}
