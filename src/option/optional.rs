use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use super::capability::{ConfigValue, TypeDescriptor};
use super::{strategy, DecodeError, RawNode};
use crate::template::{render_value, Context, Evaluator, TemplateEvaluator};

/// A configuration value that is either absent or present and fully typed.
///
/// Present values are produced by [`Optional::decode`]: the raw node is
/// rendered to text, its `{{ ... }}` actions are evaluated, and the result is
/// converted to `T` by the first strategy in [`Strategy::CHAIN`](super::Strategy::CHAIN)
/// that succeeds.
///
/// As a struct field, pair it with `#[serde(default)]` so a missing key
/// decodes to [`Optional::Absent`]:
///
/// ```
/// use serde::Deserialize;
/// use tmplcfg::Optional;
///
/// #[derive(Deserialize)]
/// struct Server {
///     #[serde(default)]
///     port: Optional<u16>,
/// }
///
/// let server: Server = serde_json::from_str(r#"{"port": "{{ \"8080\" }}"}"#).unwrap();
/// assert_eq!(server.port, Optional::Present(8080));
///
/// let server: Server = serde_json::from_str("{}").unwrap();
/// assert!(server.port.is_absent());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Optional<T> {
    Absent,
    Present(T),
}

impl<T: ConfigValue> Optional<T> {
    /// Decodes a raw node with the default [`Evaluator`].
    pub fn decode(raw: Option<&RawNode>) -> Result<Self, DecodeError> {
        Self::decode_with(&Evaluator::new(), raw)
    }

    /// Decodes a raw node, resolving templates with `evaluator`.
    ///
    /// A missing or `null` node is [`Optional::Absent`] and never reaches the
    /// evaluator. Otherwise the evaluator always receives an empty context.
    pub fn decode_with<E>(evaluator: &E, raw: Option<&RawNode>) -> Result<Self, DecodeError>
    where
        E: TemplateEvaluator + ?Sized,
    {
        let node = match raw {
            None | Some(RawNode::Null) => return Ok(Self::Absent),
            Some(node) => node,
        };

        let input = render_value(node);
        let resolved = match evaluator.evaluate(&input, &Context::new()) {
            Ok(resolved) => resolved,
            Err(source) => return Err(DecodeError::TemplateEvaluation { input, source }),
        };

        let (value, _) = strategy::convert(&TypeDescriptor::<T>::of(), &resolved)?;
        Ok(Self::Present(value))
    }
}

impl<T> Optional<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_ref(&self) -> Optional<&T> {
        match self {
            Self::Absent => Optional::Absent,
            Self::Present(value) => Optional::Present(value),
        }
    }

    /// Borrows the payload as a standard `Option`.
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Absent => None,
            Self::Present(value) => Some(value),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Absent => None,
            Self::Present(value) => Some(value),
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.into_option().unwrap_or(default)
    }

    pub fn unwrap_or_else(self, f: impl FnOnce() -> T) -> T {
        self.into_option().unwrap_or_else(f)
    }

    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.into_option().unwrap_or_default()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Optional<U> {
        match self {
            Self::Absent => Optional::Absent,
            Self::Present(value) => Optional::Present(f(value)),
        }
    }

    pub fn ok_or<E>(self, err: E) -> Result<T, E> {
        self.into_option().ok_or(err)
    }
}

impl<T> Default for Optional<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            None => Self::Absent,
            Some(value) => Self::Present(value),
        }
    }
}

impl<T> From<Optional<T>> for Option<T> {
    fn from(value: Optional<T>) -> Self {
        value.into_option()
    }
}

impl<T: Serialize> Serialize for Optional<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Present(value) => serializer.serialize_some(value),
        }
    }
}

impl<'de, T: ConfigValue> Deserialize<'de> for Optional<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut raw = Option::<RawNode>::deserialize(deserializer)?;
        if let Some(node) = raw.as_mut() {
            unwrap_toml_datetimes(node);
        }
        Self::decode(raw.as_ref()).map_err(de::Error::custom)
    }
}

/// Key under which `toml` hands a datetime to a self-describing deserializer.
const TOML_DATETIME_FIELD: &str = "$__toml_private_datetime";

/// Replaces `toml` datetime wrappers with their RFC 3339 text, so a struct
/// read straight from `toml::from_str` sees the same node as one built by
/// [`Config`](crate::Config).
fn unwrap_toml_datetimes(node: &mut RawNode) {
    let datetime = match node {
        RawNode::Object(map) if map.len() == 1 => map
            .get(TOML_DATETIME_FIELD)
            .and_then(RawNode::as_str)
            .map(str::to_owned),
        _ => None,
    };
    if let Some(text) = datetime {
        *node = RawNode::String(text);
        return;
    }

    match node {
        RawNode::Object(map) => map.values_mut().for_each(unwrap_toml_datetimes),
        RawNode::Array(items) => items.iter_mut().for_each(unwrap_toml_datetimes),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::TextParse;
    use crate::template::TemplateError;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("bad format")]
    struct BadFormat;

    #[derive(Debug, PartialEq, Deserialize)]
    struct AlwaysFails(String);

    impl TextParse for AlwaysFails {
        type Err = BadFormat;

        fn parse_text(_text: &str) -> Result<Self, Self::Err> {
            Err(BadFormat)
        }
    }

    crate::config_value!(text: AlwaysFails);

    /// Evaluator that counts calls and returns its input unchanged.
    struct Counting(AtomicUsize);

    impl TemplateEvaluator for Counting {
        fn evaluate(&self, input: &str, _context: &Context) -> Result<String, TemplateError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(input.to_string())
        }
    }

    #[test]
    fn test_absent_node_skips_evaluator() {
        let evaluator = Counting(AtomicUsize::new(0));
        let decoded = Optional::<i64>::decode_with(&evaluator, None).unwrap();
        assert_eq!(decoded, Optional::Absent);
        let decoded = Optional::<AlwaysFails>::decode_with(&evaluator, Some(&RawNode::Null)).unwrap();
        assert_eq!(decoded, Optional::Absent);
        assert_eq!(evaluator.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_string_node_into_int() {
        let evaluator = Counting(AtomicUsize::new(0));
        let decoded = Optional::<i64>::decode_with(&evaluator, Some(&json!("42"))).unwrap();
        assert_eq!(decoded, Optional::Present(42));
        assert_eq!(evaluator.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_direct_parse_error_not_fallen_through() {
        let err = Optional::<AlwaysFails>::decode(Some(&json!("x"))).unwrap_err();
        assert!(matches!(err, DecodeError::DirectParse { .. }));
        assert_eq!(err.to_string(), "bad format");
    }

    #[test]
    fn test_unresolvable_reference() {
        let err = Optional::<bool>::decode(Some(&json!("{{ .missing }}"))).unwrap_err();
        match err {
            DecodeError::TemplateEvaluation { input, source } => {
                assert_eq!(input, "{{ .missing }}");
                assert_eq!(source, TemplateError::MissingKey("missing".into()));
            }
            other => panic!("expected TemplateEvaluation, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_round_trip() {
        assert_eq!(
            Optional::<String>::decode(Some(&json!("plain text"))).unwrap(),
            Optional::Present("plain text".to_string())
        );
        assert_eq!(
            Optional::<i32>::decode(Some(&json!(-17))).unwrap(),
            Optional::Present(-17)
        );
        assert_eq!(
            Optional::<bool>::decode(Some(&json!(true))).unwrap(),
            Optional::Present(true)
        );
        assert_eq!(
            Optional::<String>::decode(Some(&json!("true"))).unwrap(),
            Optional::Present("true".to_string())
        );
    }

    #[test]
    fn test_composite_node_decodes_structurally() {
        let decoded = Optional::<Vec<u16>>::decode(Some(&json!([80, 443]))).unwrap();
        assert_eq!(decoded, Optional::Present(vec![80, 443]));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let node = json!("{{ \"7\" }}");
        let first = Optional::<u8>::decode(Some(&node)).unwrap();
        let second = Optional::<u8>::decode(Some(&node)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Optional::Present(7));
    }

    #[test]
    fn test_toml_datetime_read_directly() {
        #[derive(Deserialize)]
        struct Release {
            #[serde(default)]
            at: Optional<String>,
            #[serde(default)]
            windows: Optional<Vec<String>>,
        }

        let release: Release = toml::from_str(
            "at = 1979-05-27T07:32:00Z\nwindows = [1979-05-27, 07:32:00]\n",
        )
        .unwrap();
        assert_eq!(release.at, Optional::Present("1979-05-27T07:32:00Z".to_string()));
        assert_eq!(
            release.windows,
            Optional::Present(vec!["1979-05-27".to_string(), "07:32:00".to_string()])
        );
    }

    #[test]
    fn test_accessors() {
        let present = Optional::Present(5);
        let absent: Optional<i32> = Optional::Absent;
        assert!(present.is_present());
        assert!(absent.is_absent());
        assert_eq!(present.as_option(), Some(&5));
        assert_eq!(absent.as_option(), None);
        assert_eq!(absent.clone().unwrap_or(3), 3);
        assert_eq!(present.clone().map(|v| v * 2), Optional::Present(10));
        assert_eq!(absent.clone().ok_or("missing"), Err("missing"));
        assert_eq!(Optional::from(Some(1)), Optional::Present(1));
        assert_eq!(Option::from(present), Some(5));
        assert_eq!(Optional::<i32>::default(), Optional::Absent);
    }

    #[test]
    fn test_serde_field() {
        #[derive(Debug, Deserialize, Serialize)]
        struct Section {
            #[serde(default)]
            port: Optional<u16>,
            #[serde(default)]
            name: Optional<String>,
        }

        let section: Section = serde_json::from_value(json!({ "port": "8080" })).unwrap();
        assert_eq!(section.port, Optional::Present(8080));
        assert!(section.name.is_absent());
        assert_eq!(
            serde_json::to_value(&section).unwrap(),
            json!({ "port": 8080, "name": null })
        );

        let err = serde_json::from_value::<Section>(json!({ "port": "{{ .nope }}" })).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
