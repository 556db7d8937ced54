// SPDX-License-Identifier: Apache-2.0

pub mod credentials;
pub mod storage;

pub use credentials::{DbConfigRecord, TargetDatabase};
pub use storage::{JsonDirectory, MemoryDirectory, TargetDirectory};
