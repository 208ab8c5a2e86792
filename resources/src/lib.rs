// Copyright (c) The oauth2-proxy-manager Authors. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;

use opm_common::settings::Settings;
use sha2::{Digest, Sha256};

pub mod config_map;
pub mod deployment;
pub mod error;
pub mod ingress;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod reconciler;
pub mod secret;
pub mod service;
pub mod store;

const MANAGED_BY: &str = "oauth2-proxy-manager";

/// Hex encoded SHA-256 digest of the given data.
pub fn hash(data: impl AsRef<[u8]>) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Returns a list of arguments in one-dash or two-dash style.
#[inline]
pub fn args(args: &[(&str, &str)], dash: i8) -> Vec<String> {
    args.iter()
        .map(|(key, value)| {
            if dash == 1 {
                format!("-{}={}", key, value)
            } else {
                format!("--{}={}", key, value)
            }
        })
        .collect()
}

/// The selector labels shared by a proxy's deployment, pods and service.
fn selector(settings: &Settings) -> BTreeMap<String, String> {
    BTreeMap::from([("app".into(), settings.resource_name())])
}

fn labels(settings: &Settings) -> BTreeMap<String, String> {
    let mut labels = selector(settings);
    labels.insert("app.kubernetes.io/managed-by".into(), MANAGED_BY.into());
    labels
}
