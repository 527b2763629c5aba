use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, Deserializer, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};

/// Reduces a key to its comparison form: lowercase with `_` and `-` removed, so
/// `documentList`, `DOCUMENTLIST`, `document_list` and `document-list` compare equal.
pub fn loose_key(key: &str) -> String {
    key.chars()
        .filter(|ch| *ch != '_' && *ch != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn keys_match(left: &str, right: &str) -> bool {
    loose_key(left) == loose_key(right)
}

/// Rewrites the keys of one object level to their comparison form. On collisions
/// the last key wins.
pub fn fold_object(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (loose_key(&key), value))
        .collect()
}

/// Deserializes a JSON tree, matching every struct field name it meets without
/// regard to case or separators.
///
/// Each object read as a struct has its keys renamed to the declared field (or
/// alias) they loosely match. An exact key always wins over a loose one and keys
/// that match nothing are passed through.
pub struct CaseInsensitive(pub Value);

impl CaseInsensitive {
    pub fn deserialize<T>(value: Value) -> Result<T, serde_json::Error>
    where
        T: de::DeserializeOwned,
    {
        <T as de::Deserialize>::deserialize(CaseInsensitive(value))
    }
}

fn align_keys(fields: Map<String, Value>, declared: &[&str]) -> Map<String, Value> {
    let declared: Vec<(&str, String)> = declared
        .iter()
        .map(|name| (*name, loose_key(name)))
        .collect();
    let mut aligned = Map::with_capacity(fields.len());
    let mut exact = Vec::new();
    for (key, value) in fields {
        if declared.iter().any(|(name, _)| *name == key) {
            exact.push(key.clone());
            aligned.insert(key, value);
            continue;
        }
        let loose = loose_key(&key);
        match declared.iter().find(|(_, folded)| *folded == loose) {
            Some((name, _)) if exact.iter().any(|taken| taken == name) => {}
            Some((name, _)) => {
                aligned.insert((*name).to_string(), value);
            }
            None => {
                aligned.insert(key, value);
            }
        }
    }
    aligned
}

fn visit_object<'de, V>(
    fields: Map<String, Value>,
    visitor: V,
) -> Result<V::Value, serde_json::Error>
where
    V: Visitor<'de>,
{
    let mut map = MapDeserializer::new(
        fields
            .into_iter()
            .map(|(key, value)| (key, CaseInsensitive(value))),
    );
    let value = visitor.visit_map(&mut map)?;
    map.end()?;
    Ok(value)
}

impl<'de> Deserializer<'de> for CaseInsensitive {
    type Error = serde_json::Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Object(fields) => visit_object(fields, visitor),
            Value::Array(items) => {
                let mut seq = SeqDeserializer::new(items.into_iter().map(CaseInsensitive));
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(CaseInsensitive(other)),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Object(object) => visit_object(align_keys(object, fields), visitor),
            other => CaseInsensitive(other).deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.0.deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier ignored_any
    }
}

impl<'de> IntoDeserializer<'de, serde_json::Error> for CaseInsensitive {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}
