//! Fixed option sets for the categorical measurement columns.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::MeasureError;

/// A column whose cells hold one of a fixed set of option names.
pub trait Categorical: Sized + Copy + Default + 'static {
    /// Column name in the row store.
    const FIELD: &'static str;
    /// Every option, in display order.
    const ALL: &'static [Self];

    /// Stored option name.
    fn as_str(&self) -> &'static str;

    /// Look up an option by its stored name (exact match).
    fn from_name(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }

    /// Parse user input, matching option names case-insensitively.
    fn parse(s: &str) -> Result<Self, MeasureError> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| MeasureError::InvalidField {
                field: Self::FIELD.to_string(),
                value: s.to_string(),
            })
    }
}

/// Read a categorical cell.
///
/// Accepts plain text or a single-select object (`{"id": .., "value": ..}`).
/// Blank and `null` cells take the column default; unknown names are rejected.
fn decode_cell<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Categorical,
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let name = match &value {
        Value::Null => return Ok(T::default()),
        Value::String(s) => s.as_str(),
        Value::Object(map) => match map.get("value") {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Null) | None => return Ok(T::default()),
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "invalid value for '{}': '{}'",
                    T::FIELD,
                    other
                )))
            }
        },
        other => {
            return Err(D::Error::custom(format!(
                "invalid value for '{}': '{}'",
                T::FIELD,
                other
            )))
        }
    };

    if name.trim().is_empty() {
        return Ok(T::default());
    }

    T::from_name(name).ok_or_else(|| {
        D::Error::custom(format!("invalid value for '{}': '{}'", T::FIELD, name))
    })
}

macro_rules! categorical_column {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $stored:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl Categorical for $name {
            const FIELD: &'static str = $field;
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $stored ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = MeasureError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as Categorical>::parse(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                decode_cell(deserializer)
            }
        }
    };
}

categorical_column! {
    /// Blind product line.
    BlindType, "Blind_Type" {
        #[default]
        Zebra => "Zebra",
        Roller => "Roller",
        Honeycomb => "Honeycomb",
        Shangrila => "Shangrila",
        Dream => "Dream",
    }
}

categorical_column! {
    /// How the blind is raised and lowered.
    ControlType, "Control" {
        #[default]
        Manual => "Manual",
        Motorized => "Motorized",
    }
}

categorical_column! {
    /// Where the blind is mounted relative to the window frame.
    MountType, "Mount" {
        #[default]
        Inside => "Inside",
        Outside => "Outside",
        Ceiling => "Ceiling",
    }
}

categorical_column! {
    /// Ceiling above the window.
    CeilingType, "Ceiling_Type" {
        #[default]
        Flat => "Flat",
        Sloped => "Sloped",
        High => "High",
        PatioDoor => "Patio Door",
    }
}
