//! Property-based tests for the tracking codec.
//!
//! Covers the round-trip law in both modes, rejection of foreign keys and
//! tamper evidence of encrypted tokens.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use mailtrack::codec::{decode, encode};
use mailtrack::{Configuration, DecodeFailure, EncryptionKey, Metadata, TrackingPayload};
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for JSON-compatible metadata values.
fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(Value::from),
        "[a-zA-Z0-9 _./:-]{0,24}".prop_map(Value::from),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn metadata_strategy() -> impl Strategy<Value = Metadata> {
    prop::collection::btree_map("[a-z_]{1,12}", value_strategy(), 0..6)
}

fn url_strategy() -> impl Strategy<Value = String> {
    "https://[a-z]{1,10}\\.example/[a-z0-9/]{0,20}(\\?[a-z]=[a-z0-9+&]{1,10})?"
}

fn keyed(secret: &str) -> Configuration {
    Configuration {
        encryption_key: Some(EncryptionKey::new(secret)),
        ..Configuration::default()
    }
}

proptest! {
    #[test]
    fn plain_round_trip(metadata in metadata_strategy(), url in url_strategy()) {
        let config = Configuration::default();
        let payload = TrackingPayload::click(url, metadata);

        let token = encode(&payload, &config).unwrap();
        prop_assert!(!token.contains(['/', '+', '=']));
        prop_assert_eq!(decode(&token, &config).unwrap(), payload);
    }

    #[test]
    fn encrypted_round_trip(metadata in metadata_strategy(), url in url_strategy()) {
        let config = keyed("round-trip");
        let payload = TrackingPayload::click(url, metadata);

        let token = encode(&payload, &config).unwrap();
        prop_assert_eq!(decode(&token, &config).unwrap(), payload);
    }

    #[test]
    fn foreign_key_never_decodes(metadata in metadata_strategy(), secret in "[a-z]{1,16}") {
        prop_assume!(secret != "owner");
        let payload = TrackingPayload::open(metadata);

        let token = encode(&payload, &keyed("owner")).unwrap();
        let err = decode(&token, &keyed(&secret)).unwrap_err();
        prop_assert_eq!(err.reason, DecodeFailure::DecryptionFailed);
    }

    #[test]
    fn flipped_byte_is_rejected(metadata in metadata_strategy(), position in any::<prop::sample::Index>(), flip in 1u8..=255) {
        let config = keyed("tamper");
        let token = encode(&TrackingPayload::open(metadata), &config).unwrap();

        let mut bytes = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let index = position.index(bytes.len());
        bytes[index] ^= flip;
        let tampered = URL_SAFE_NO_PAD.encode(&bytes);

        let err = decode(&tampered, &config).unwrap_err();
        prop_assert_eq!(err.reason, DecodeFailure::DecryptionFailed);
    }
}
