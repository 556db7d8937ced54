// SPDX-License-Identifier: Apache-2.0

// Statement executors

pub mod mysql;
