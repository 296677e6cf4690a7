// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod app;
mod entry;
mod markdown;
mod render;

pub use app::{App, AppOptions};
pub use entry::ChatEntry;
