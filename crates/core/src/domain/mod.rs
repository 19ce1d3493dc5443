#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} label: {label:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

/// Normalizes a free-text label so that `"Mid Range"`, `"mid_range"` and
/// `"heritage/nightlife"` compare against kebab-case variant labels.
pub(crate) fn normalize_label(raw: &str) -> String {
    let first = raw
        .split(['/', '|', ','])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    first
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Declares a closed set of kebab-case labels with serde, `Display` and a
/// lenient `from_label` matcher. Deserialization goes through the lenient
/// matcher too, so `"Heritage"` and `"mid_range"` are accepted.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($kind:literal) {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
        $vis enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn from_label(raw: &str) -> Option<Self> {
                let key = $crate::domain::normalize_label(raw);
                Self::ALL.iter().copied().find(|v| v.as_str() == key)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_label(s).ok_or_else(|| $crate::domain::UnknownLabel {
                    kind: $kind,
                    label: s.to_string(),
                })
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use labeled_enum;

pub mod advisory;
pub mod contract;
pub mod itinerary;
pub mod trip;
