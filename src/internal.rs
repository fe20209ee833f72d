/// Soroban RPC encodes 64-bit quantities (fees, sequence numbers, timestamps)
/// as decimal strings. Some servers send plain JSON numbers instead, so both
/// are accepted when deserializing.
pub(crate) mod string_number {
    use std::{fmt::Display, str::FromStr};

    /// Serialize (via Serde) a number as a decimal string.
    pub fn serialize<S: serde::Serializer, A: Display>(v: &A, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_str(v)
    }

    /// Deserialize (via Serde) a number from a decimal string or a JSON number.
    pub fn deserialize<'de, D: serde::Deserializer<'de>, A>(des: D) -> Result<A, D::Error>
    where
        A: FromStr,
        A::Err: Display, {
        struct NumVisitor<A>(std::marker::PhantomData<A>);
        impl<'de, A> serde::de::Visitor<'de> for NumVisitor<A>
        where
            A: FromStr,
            A::Err: Display,
        {
            type Value = A;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "A number or a string containing a number.")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error, {
                v.parse().map_err(serde::de::Error::custom)
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error, {
                self.visit_str(&v.to_string())
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error, {
                self.visit_str(&v.to_string())
            }
        }
        des.deserialize_any(NumVisitor(std::marker::PhantomData))
    }
}

/// Same as [`string_number`] but for optional fields. Use together with
/// `#[serde(default)]`.
pub(crate) mod option_string_number {
    use serde::Deserialize;
    use std::{fmt::Display, str::FromStr};

    pub fn serialize<S: serde::Serializer, A: Display>(
        v: &Option<A>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        match v {
            Some(v) => ser.collect_str(v),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>, A>(des: D) -> Result<Option<A>, D::Error>
    where
        A: FromStr,
        A::Err: Display, {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(serde_json::Number),
        }
        match Option::<Raw>::deserialize(des)? {
            None => Ok(None),
            Some(Raw::Str(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
            Some(Raw::Num(n)) => n
                .to_string()
                .parse()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
