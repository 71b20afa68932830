// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{AgencyUpdate, NewAgency};

pub const MAX_SHORT_LEN: usize = 10;

/// Agency shorts are stored upper-cased so uniqueness is case-insensitive.
pub fn normalize_short(raw: &str) -> String {
    raw.trim().to_uppercase()
}

impl NewAgency {
    pub fn normalized(&self) -> Self {
        Self {
            dispatch_center_id: self.dispatch_center_id,
            short: normalize_short(&self.short),
            name: self.name.trim().to_owned(),
            kind: self.kind.trim().to_owned(),
            owned: self.owned,
            active: self.active,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let short = self.short.trim();
        if short.is_empty() {
            bail!("Short is required.");
        }
        if short.chars().count() > MAX_SHORT_LEN {
            bail!("Short must be {MAX_SHORT_LEN} characters or fewer.");
        }
        if self.name.trim().is_empty() {
            bail!("Name is required.");
        }
        if self.kind.trim().is_empty() {
            bail!("Type is required.");
        }
        Ok(())
    }
}

impl AgencyUpdate {
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            kind: self.kind.trim().to_owned(),
            owned: self.owned,
            active: self.active,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.kind.trim().is_empty() {
            bail!("Name and Type are required.");
        }
        Ok(())
    }
}
