//! Property tests over arbitrary URL-like input.

use proptest::prelude::*;
use urlsig::features::{shannon_entropy, FEATURE_COUNT};
use urlsig::{classify_traffic, extract_features, extract_features_bytes, TrafficCategory};

fn url_like() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        "(https?://)?[a-z0-9.-]{0,20}(/[a-zA-Z0-9%._~'<>;=-]{0,12}){0,4}(\\?[a-zA-Z0-9%&=+'\"<>();-]{0,40})?",
    ]
}

proptest! {
    #[test]
    fn vector_is_finite_and_non_negative(url in url_like()) {
        let fv = extract_features(&url).unwrap();
        let values = fv.to_array();
        prop_assert_eq!(values.len(), FEATURE_COUNT);
        for v in values {
            prop_assert!(v.is_finite());
            prop_assert!(v >= 0.0);
        }
        prop_assert_eq!(fv.url_length, url.chars().count() as f32);
    }

    #[test]
    fn extraction_is_deterministic(url in url_like()) {
        prop_assert_eq!(extract_features(&url).unwrap(), extract_features(&url).unwrap());
    }

    #[test]
    fn entropy_is_bounded(s in any::<String>()) {
        let h = shannon_entropy(&s);
        let distinct = s.chars().collect::<std::collections::BTreeSet<_>>().len();
        prop_assert!(h >= 0.0);
        if distinct > 0 {
            prop_assert!(h <= (distinct as f32).log2() + 1e-4);
        }
    }

    #[test]
    fn classifier_is_total(url in url_like()) {
        let c = classify_traffic(&url);
        prop_assert!(TrafficCategory::ALL.contains(&c));
        prop_assert_eq!(c, classify_traffic(&url));
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let fv = extract_features_bytes(Some(&bytes)).unwrap();
        prop_assert!(fv.to_array().iter().all(|v| v.is_finite()));
    }
}
