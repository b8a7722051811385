//! Property tests for the write guard.

use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;

use routegen::infrastructure::{MemoryFs, WriteGuard};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: repeating a write with identical content never touches disk again.
    #[test]
    fn property_identical_writes_are_idempotent(
        contents in proptest::collection::vec("[a-z ]{0,12}", 1..8),
    ) {
        let fs = MemoryFs::new();
        let guard = WriteGuard::new(Arc::new(fs.clone()));
        let path = Path::new("/p/.routegen/orders/schema.gen.ts");

        let mut expected = 0;
        let mut last: Option<&String> = None;
        for content in &contents {
            for _ in 0..2 {
                guard.write(path, content).unwrap();
            }
            if last != Some(content) {
                expected += 1;
            }
            last = Some(content);
        }

        prop_assert_eq!(fs.write_count(path), expected);
        let final_contents = fs.contents(path);
        prop_assert_eq!(final_contents.as_deref(),Some(contents[contents.len() - 1].as_str()));
    }
}
