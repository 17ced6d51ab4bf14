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

//! Error type for sketch configuration.

use std::fmt;

/// Error returned by fallible sketch constructors.
///
/// Every failure in this crate is a configuration problem caught before any
/// stream data is touched, so an error is simply the parameter at fault and
/// the constraint it broke.
///
/// # Examples
///
/// ```
/// # use unisketch::schema::Column;
/// # use unisketch::schema::Schema;
/// # use unisketch::universal::UniversalSketchBuilder;
/// let schema = Schema::new(vec![Column::new("key", 8)]);
/// let err = UniversalSketchBuilder::with_shape(4, 5, 1024, 0, 0.01)
///     .build(schema, "key")
///     .unwrap_err();
/// assert_eq!(err.parameter(), "k");
/// assert_eq!(err.to_string(), "invalid sketch configuration: k must be at least 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    parameter: &'static str,
    constraint: String,
}

impl Error {
    pub(crate) fn invalid(parameter: &'static str, constraint: impl Into<String>) -> Self {
        Self {
            parameter,
            constraint: constraint.into(),
        }
    }

    /// Returns the name of the rejected parameter.
    pub fn parameter(&self) -> &str {
        self.parameter
    }

    /// Returns the constraint the parameter violated.
    pub fn constraint(&self) -> &str {
        self.constraint.as_str()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid sketch configuration: {} {}",
            self.parameter, self.constraint
        )
    }
}

impl std::error::Error for Error {}
