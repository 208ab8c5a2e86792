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

use kube::Client;
use opm_resources::reconciler::Reconciler;
use opm_resources::store::KubeStore;

use crate::config::Config;

/// The core type through which the watchers access common state.
pub struct Context {
    pub k8s: Client,
    pub config: Config,
    pub reconciler: Reconciler<KubeStore>,
}

impl Context {
    /// Resolves cluster credentials from the kubeconfig or the in-cluster
    /// service account; failing to do so is fatal.
    pub async fn new(config: Config) -> anyhow::Result<Context> {
        let k8s = Client::try_default().await?;
        let reconciler = Reconciler::new(KubeStore::new(k8s.clone()), config.environment());

        Ok(Context { k8s, config, reconciler })
    }
}
