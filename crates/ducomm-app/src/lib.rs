// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod agencies;
pub mod agency_create;
pub mod agency_detail;
pub mod agency_edit;
pub mod auth;
pub mod factory;
pub mod forms;
pub mod ids;
pub mod model;
pub mod nav;
pub mod return_state;
pub mod view;

pub use agencies::*;
pub use agency_create::*;
pub use agency_detail::*;
pub use agency_edit::*;
pub use auth::*;
pub use factory::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use nav::*;
pub use return_state::*;
pub use view::*;
