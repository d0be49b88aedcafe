pub use self::address::*;
pub use self::cell::*;
pub use self::serde_helpers::*;

mod address;
mod cell;
mod crc;
mod serde_helpers;

/// Defines an enum with a fixed string representation for each variant
#[macro_export]
macro_rules! define_string_enum {
    ($(#[$outer:meta])* $vis:vis enum $type:ident { $($(#[$inner:meta])* $variant:ident => $name:literal),*$(,)? }) => {
        $(#[$outer])*
        $vis enum $type {
            $($(#[$inner])* $variant),*,
        }

        impl $type {
            #[inline(always)]
            $vis fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),*,
                }
            }
        }

        impl std::str::FromStr for $type {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(match s {
                    $($name => Self::$variant),*,
                    _ => return Err($crate::UnknownEnumVariant.into()),
                })
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &'_ mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(thiserror::Error, Debug, Copy, Clone)]
#[error("Unknown enum variant")]
pub struct UnknownEnumVariant;
