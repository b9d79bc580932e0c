use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(TypeTag {
    Invoice => "invoice",
    Contract => "contract",
    DeliveryNote => "delivery_note",
    Check => "check",
    Receipt => "receipt",
    CashReport => "cash_report",
    BankStatement => "bank_statement",
    OfficialReport => "official_report",
    Unknown => "unknown",
});

str_enum!(ReviewStatus {
    Pending => "pending",
    Validated => "validated",
    Archived => "archived",
});

str_enum!(Language {
    Ro => "ro",
    Ru => "ru",
});

impl Default for Language {
    fn default() -> Self {
        Self::Ro
    }
}
