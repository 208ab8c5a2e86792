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

use opm_resources::reconciler::ResourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Resolve Ingress Stream Failed: {0}")]
    ResolveIngressStreamFailed(#[source] kube::runtime::watcher::Error),

    #[error("Apply {0} Failed: {1}")]
    ApplyError(ResourceKind, #[source] opm_resources::error::Error),
}

impl Error {
    /// Whether a later event for the same ingress may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ResolveIngressStreamFailed(_) => true,
            Error::ApplyError(_, err) => err.is_retryable(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
