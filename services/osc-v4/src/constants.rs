// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

// Headers used in outscale services.
pub const X_OSC_DATE: &str = "x-osc-date";
pub const X_AMZ_DATE: &str = "x-amz-date";
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

// Env values used in outscale services.
pub const OSC_ACCESS_KEY: &str = "OSC_ACCESS_KEY";
pub const OSC_SECRET_KEY: &str = "OSC_SECRET_KEY";
pub const OSC_REGION: &str = "OSC_REGION";
pub const OSC_SERVICE: &str = "OSC_SERVICE";
pub const OSC_API_VERSION: &str = "OSC_API_VERSION";
pub const OSC_BASE_URI: &str = "OSC_BASE_URI";

// Defaults of the outscale API.
pub const DEFAULT_REGION: &str = "eu-west-2";
pub const DEFAULT_SERVICE: &str = "api";
pub const DEFAULT_VERSION: &str = "latest";
pub const DEFAULT_BASE_URI: &str = "outscale.com";

/// The only method the outscale API accepts.
pub const SIGNING_METHOD: &str = "POST";

/// AsciiSet for UriEncode of a single path segment or query component.
///
/// - URI encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
/// - `%` is handled by the caller so that existing `%XX` escapes survive.
pub static URI_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
