// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod service;
pub mod shell;

pub use service::*;
pub use shell::*;
