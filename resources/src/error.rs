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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SerializationError: {0}")]
    SerializationError(#[source] serde_json::Error),

    #[error("Kube Error: {0}")]
    KubeError(#[source] kube::Error),

    #[error("Conflict: {kind} {name} was modified concurrently")]
    Conflict { kind: String, name: String },

    #[error("NotFound: {kind} {name}")]
    NotFound { kind: String, name: String },

    #[error("Invalid: {kind} {name}: {reason}")]
    Invalid { kind: String, name: String, reason: String },
}

impl Error {
    /// Classify a raw API error for the given object.
    pub fn from_kube(kind: &str, name: &str, err: kube::Error) -> Self {
        if let kube::Error::Api(response) = &err {
            let (kind, name) = (kind.to_string(), name.to_string());
            match response.code {
                409 => return Error::Conflict { kind, name },
                404 => return Error::NotFound { kind, name },
                422 => return Error::Invalid { kind, name, reason: response.message.clone() },
                _ => {}
            }
        }
        Error::KubeError(err)
    }

    /// Whether trying again on a later event (or immediately, for conflicts)
    /// can be expected to succeed. Client-side kube errors other than
    /// transport failures are fatal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Conflict { .. } => true,
            Error::KubeError(kube::Error::Api(response)) => response.code == 429 || response.code >= 500,
            Error::KubeError(kube::Error::HyperError(_) | kube::Error::Service(_)) => true,
            _ => false,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
