//! Scalar parse and format rules.
//!
//! One generic parse/format operation parameterized by a closed set of
//! scalar kinds replaces per-width method overloads. The trait is sealed:
//! the set of scalar types is fixed by this module.

mod sealed {
    pub trait Sealed {}
}

/// The closed set of scalar kinds. Used in diagnostics to name the type a
/// decode expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    UInt,
    Float,
    String,
}

impl ScalarKind {
    /// Human-readable name for error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::UInt => "unsigned integer",
            Self::Float => "floating-point number",
            Self::String => "string",
        }
    }
}

/// A non-finite floating-point class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonFinite {
    PositiveInfinity,
    NegativeInfinity,
    Nan,
}

/// A type with a direct text representation in element content and
/// attribute values.
///
/// Sealed; implemented for `bool`, the fixed-width integers, `f32`/`f64`,
/// and `String`.
pub trait Scalar: sealed::Sealed + Sized {
    /// The kind tag, for diagnostics.
    const KIND: ScalarKind;

    /// Parses the scalar from derived text. `None` means the text does not
    /// represent a value of this type.
    fn parse_scalar(text: &str) -> Option<Self>;

    /// Formats the scalar as element text.
    fn format_scalar(&self) -> String;

    /// Classifies a non-finite value. Always `None` except for floats.
    fn nonfinite(&self) -> Option<NonFinite> {
        None
    }

    /// Builds the value for a non-finite class. Always `None` except for
    /// floats.
    fn from_nonfinite(_class: NonFinite) -> Option<Self> {
        None
    }
}

impl sealed::Sealed for bool {}

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    /// Exact, case-sensitive `"true"` or `"false"`.
    fn parse_scalar(text: &str) -> Option<Self> {
        match text {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn format_scalar(&self) -> String {
        self.to_string()
    }
}

macro_rules! impl_int_scalar {
    ($kind:expr => $($t:ty),+) => {
        $(
            impl sealed::Sealed for $t {}

            impl Scalar for $t {
                const KIND: ScalarKind = $kind;

                fn parse_scalar(text: &str) -> Option<Self> {
                    text.parse().ok()
                }

                fn format_scalar(&self) -> String {
                    self.to_string()
                }
            }
        )+
    };
}

impl_int_scalar!(ScalarKind::Int => i8, i16, i32, i64);
impl_int_scalar!(ScalarKind::UInt => u8, u16, u32, u64);

macro_rules! impl_float_scalar {
    ($($t:ty),+) => {
        $(
            impl sealed::Sealed for $t {}

            impl Scalar for $t {
                const KIND: ScalarKind = ScalarKind::Float;

                fn parse_scalar(text: &str) -> Option<Self> {
                    text.parse().ok()
                }

                fn format_scalar(&self) -> String {
                    self.to_string()
                }

                fn nonfinite(&self) -> Option<NonFinite> {
                    if self.is_nan() {
                        Some(NonFinite::Nan)
                    } else if *self == <$t>::INFINITY {
                        Some(NonFinite::PositiveInfinity)
                    } else if *self == <$t>::NEG_INFINITY {
                        Some(NonFinite::NegativeInfinity)
                    } else {
                        None
                    }
                }

                fn from_nonfinite(class: NonFinite) -> Option<Self> {
                    Some(match class {
                        NonFinite::PositiveInfinity => <$t>::INFINITY,
                        NonFinite::NegativeInfinity => <$t>::NEG_INFINITY,
                        NonFinite::Nan => <$t>::NAN,
                    })
                }
            }
        )+
    };
}

impl_float_scalar!(f32, f64);

impl sealed::Sealed for String {}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn parse_scalar(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn format_scalar(&self) -> String {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_exact_match_only() {
        assert_eq!(bool::parse_scalar("true"), Some(true));
        assert_eq!(bool::parse_scalar("false"), Some(false));
        assert_eq!(bool::parse_scalar("True"), None);
        assert_eq!(bool::parse_scalar("1"), None);
        assert_eq!(bool::parse_scalar(""), None);
    }

    #[test]
    fn test_int_boundaries() {
        assert_eq!(i8::parse_scalar("-128"), Some(i8::MIN));
        assert_eq!(i8::parse_scalar("127"), Some(i8::MAX));
        assert_eq!(i8::parse_scalar("128"), None);
        assert_eq!(u64::parse_scalar("18446744073709551615"), Some(u64::MAX));
        assert_eq!(u8::parse_scalar("-1"), None);
        assert_eq!(i32::parse_scalar("12.5"), None);
    }

    #[test]
    fn test_float_parse_and_format() {
        assert_eq!(f64::parse_scalar("2.5"), Some(2.5));
        assert_eq!(2.5f64.format_scalar(), "2.5");
        assert_eq!(f32::parse_scalar("abc"), None);
    }

    #[test]
    fn test_nonfinite_classification() {
        assert_eq!(f64::NAN.nonfinite(), Some(NonFinite::Nan));
        assert_eq!(
            f64::INFINITY.nonfinite(),
            Some(NonFinite::PositiveInfinity)
        );
        assert_eq!(
            f32::NEG_INFINITY.nonfinite(),
            Some(NonFinite::NegativeInfinity)
        );
        assert_eq!(1.0f64.nonfinite(), None);
        assert_eq!(42i32.nonfinite(), None);
    }

    #[test]
    fn test_from_nonfinite() {
        assert_eq!(
            f64::from_nonfinite(NonFinite::PositiveInfinity),
            Some(f64::INFINITY)
        );
        assert!(f32::from_nonfinite(NonFinite::Nan).is_some_and(f32::is_nan));
        assert_eq!(i32::from_nonfinite(NonFinite::Nan), None);
    }

    #[test]
    fn test_string_is_verbatim() {
        assert_eq!(String::parse_scalar("  x "), Some("  x ".to_string()));
    }
}
