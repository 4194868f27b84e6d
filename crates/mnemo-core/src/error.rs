// Copyright 2026 The Mnemo Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

/// Contract violations in the scheduler. These indicate a bug in the
/// caller, not a runtime condition, and are never retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    /// The grade value is outside the recognized set.
    InvalidGrade(String),
    /// The requested transition is not valid for the card's current state,
    /// e.g. answering a suspended card without unsuspending it first.
    InvalidState(String),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::InvalidGrade(g) => write!(f, "invalid grade: {g}"),
            SchedulerError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
        }
    }
}

impl Error for SchedulerError {}
