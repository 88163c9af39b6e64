// API Skeleton
// Copyright 2024 The api-skeleton authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Test utilities for driver tests.

use crate::clocks::testutils::MonotonicClock;
use crate::db::memory::MemoryDb;
use crate::driver::Driver;
use std::sync::Arc;

/// Creates a driver backed by an empty in-memory store and a deterministic
/// clock, returning the store as well so tests can inspect it directly.
pub(crate) fn setup() -> (Arc<MemoryDb>, Driver) {
    let db = Arc::new(MemoryDb::default());
    let clock = Arc::new(MonotonicClock::new(100_000));
    (db.clone(), Driver::new(db, clock))
}
