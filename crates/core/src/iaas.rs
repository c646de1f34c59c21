// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supported infrastructure providers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::BblError;

/// Tag selecting one row of the per-IaaS dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Iaas {
    Aws,
    Gcp,
    Azure,
    #[serde(rename = "openstack")]
    OpenStack,
    #[serde(rename = "cloudstack")]
    CloudStack,
    Vsphere,
}

impl Iaas {
    pub const ALL: [Iaas; 6] =
        [Iaas::Aws, Iaas::Gcp, Iaas::Azure, Iaas::OpenStack, Iaas::CloudStack, Iaas::Vsphere];

    pub fn as_str(&self) -> &'static str {
        match self {
            Iaas::Aws => "aws",
            Iaas::Gcp => "gcp",
            Iaas::Azure => "azure",
            Iaas::OpenStack => "openstack",
            Iaas::CloudStack => "cloudstack",
            Iaas::Vsphere => "vsphere",
        }
    }
}

impl fmt::Display for Iaas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Iaas {
    type Err = BblError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Iaas::ALL.into_iter().find(|iaas| iaas.as_str() == s.trim().to_ascii_lowercase()).ok_or_else(
            || {
                BblError::UserInput(format!(
                    "unknown iaas {s:?}: expected one of aws, gcp, azure, openstack, cloudstack, vsphere"
                ))
            },
        )
    }
}
