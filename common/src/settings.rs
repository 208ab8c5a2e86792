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

use std::fmt;
use std::str::FromStr;

/// Prefix shared by every resource the manager owns.
pub const RESOURCE_PREFIX: &str = "oauth2-proxy";

/// The identity provider an oauth2-proxy instance authenticates against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    /// Organization and team gated GitHub login.
    #[default]
    GitHub,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GitHub => "github",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported provider: {0}")]
pub struct UnsupportedProvider(pub String);

impl FromStr for Provider {
    type Err = UnsupportedProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Provider::GitHub),
            other => Err(UnsupportedProvider(other.to_string())),
        }
    }
}

/// Settings decoded from the annotations of one managed ingress,
/// describing a single requested oauth2-proxy instance.
///
/// A `Settings` value is built fresh for every observed event and is never
/// persisted; everything the manager creates is a projection of it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub app_name: String,
    pub auth_url: String,
    pub auth_signin: String,
    pub provider: Provider,
    pub organization: String,
    /// Authorized teams, kept in annotation order.
    pub teams: Vec<String>,
}

impl Settings {
    /// The name shared by the service, secret, configmap and deployment,
    /// e.g. `oauth2-proxy-github-acme-foo`.
    pub fn resource_name(&self) -> String {
        format!("{}-{}-{}-{}", RESOURCE_PREFIX, self.provider, self.organization, self.app_name)
    }

    /// The path prefix this instance is exposed under on the shared ingress.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.provider, self.app_name)
    }

    /// The key holding the cookie secret inside the generated secret.
    pub fn cookie_secret_key(&self) -> String {
        format!("{}-{}-{}-cookie-secret", self.provider, self.organization, self.app_name)
    }

    pub fn cookie_name(&self) -> String {
        format!("_{}_{}_{}_oauth2_proxy", self.provider, self.organization, self.app_name)
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.app_name)
    }
}
