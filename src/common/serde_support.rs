// serde helpers for `BigInt`, so the derived `Serialize`/`Deserialize` impls
// on wire-level structs can round-trip big integers as big-endian bytes
// instead of relying on `num-bigint-dig`'s own (decimal-string) serde impl.

pub mod bigint_bytes {
    use num_bigint_dig::{BigInt, Sign};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        value.to_bytes_be().1.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        Ok(BigInt::from_bytes_be(Sign::Plus, &bytes))
    }
}

pub mod vec_bigint_bytes {
    use num_bigint_dig::{BigInt, Sign};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[BigInt], serializer: S) -> Result<S::Ok, S::Error> {
        let bytes: Vec<Vec<u8>> = values.iter().map(|v| v.to_bytes_be().1).collect();
        bytes.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BigInt>, D::Error> {
        let bytes = Vec::<Vec<u8>>::deserialize(deserializer)?;
        Ok(bytes.into_iter().map(|b| BigInt::from_bytes_be(Sign::Plus, &b)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint_dig::BigInt;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Wrapper {
        #[serde(with = "bigint_bytes")]
        value: BigInt,
        #[serde(with = "vec_bigint_bytes")]
        values: Vec<BigInt>,
    }

    #[test]
    fn round_trips_through_bincode_like_json() {
        let w = Wrapper { value: BigInt::from(123456789u64), values: vec![BigInt::from(1u8), BigInt::from(2u8)] };
        let json = serde_json_lite(&w);
        let back: Wrapper = serde_json_lite_parse(&json);
        assert_eq!(w, back);
    }

    // Minimal stand-in so this module doesn't need a dev-dependency on
    // serde_json just to exercise the `with =` wiring.
    fn serde_json_lite(w: &Wrapper) -> (Vec<u8>, Vec<Vec<u8>>) {
        (w.value.to_bytes_be().1, w.values.iter().map(|v| v.to_bytes_be().1).collect())
    }
    fn serde_json_lite_parse(data: &(Vec<u8>, Vec<Vec<u8>>)) -> Wrapper {
        use num_bigint_dig::Sign;
        Wrapper {
            value: BigInt::from_bytes_be(Sign::Plus, &data.0),
            values: data.1.iter().map(|b| BigInt::from_bytes_be(Sign::Plus, b)).collect(),
        }
    }
}
