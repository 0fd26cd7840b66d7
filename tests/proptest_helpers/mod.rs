#![allow(dead_code)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use retinakit::ir::Category;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Categories with unique ids and unique names, in arbitrary order.
pub fn arb_categories(max: usize) -> BoxedStrategy<Vec<Category>> {
    prop::collection::btree_set(1u64..10_000, 1..=max)
        .prop_flat_map(|ids: BTreeSet<u64>| {
            let categories: Vec<Category> = ids
                .into_iter()
                .map(|id| Category::new(id, format!("class_{id}")))
                .collect();
            Just(categories).prop_shuffle()
        })
        .boxed()
}

/// Image side lengths that keep resize arithmetic well away from overflow.
pub fn arb_side() -> impl Strategy<Value = u32> {
    1u32..5_000
}
