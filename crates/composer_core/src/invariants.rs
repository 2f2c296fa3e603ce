// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Full-content invariant checks after every pipeline step.
//!
//! Cheap bounds assertions are always on.  Walking the whole content after
//! each edit is only done in tests and with the `assert-invariants` feature.

use crate::content::ContentModel;

cfg_if::cfg_if! {
    if #[cfg(any(test, feature = "assert-invariants"))] {
        pub(crate) fn assert_content(content: &ContentModel) {
            if let Err(e) = content.validate() {
                panic!("content invariant violated: {e}");
            }
        }
    } else {
        #[inline(always)]
        pub(crate) fn assert_content(_content: &ContentModel) {}
    }
}
