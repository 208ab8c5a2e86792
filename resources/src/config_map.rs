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

use k8s_openapi::api::core::v1::ConfigMap;
use kube::core::ObjectMeta;
use opm_common::config::Environment;
use opm_common::settings::Settings;

use super::labels;

pub const CONFIG_FILE: &str = "oauth2_proxy.cfg";
const CONFIG_CONTENT: &str = "email_domains = [ \"*\" ]\nupstreams = [ \"file:///dev/null\" ]";

pub fn new(settings: &Settings, env: &Environment) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(settings.resource_name()),
            namespace: Some(env.namespace.clone()),
            labels: Some(labels(settings)),
            ..ObjectMeta::default()
        },
        data: Some(BTreeMap::from([(CONFIG_FILE.into(), CONFIG_CONTENT.into())])),
        ..ConfigMap::default()
    }
}
