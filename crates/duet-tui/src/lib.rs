// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod animation;
mod app;
mod keys;
mod layout;
mod widgets;
mod wrap;

pub use app::{App, AppOptions};
