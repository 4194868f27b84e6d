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

//! mnemo-core: deterministic scheduling for the mnemo spaced repetition
//! engine.
//!
//! This crate is pure: no I/O, no clock access (except behind the `clock`
//! feature), no mutable state. It provides:
//! - The collection data model (notes, cards, decks, review log, metadata)
//! - The scheduling state machine (`scheduler::answer`)
//! - Due-queue construction with per-deck daily limits (`due::build_queue`)
//! - Per-field last-writer-wins note merging for reconciliation

pub mod due;
pub mod error;
pub mod params;
pub mod rng;
pub mod scheduler;
pub mod types;

// Re-exports for convenience
pub use due::{DayCounts, build_queue};
pub use error::SchedulerError;
pub use params::SchedulerParams;
pub use scheduler::{Answered, answer};
pub use types::card::Card;
pub use types::date::Date;
pub use types::deck::{Deck, expand_scope, parents_acyclic};
pub use types::ease::Ease;
pub use types::grade::Grade;
pub use types::ids::{CardId, DeckId, LogId, NoteId};
pub use types::meta::CollectionMeta;
pub use types::note::{LostField, Note, NoteField};
pub use types::queue::{Queue, StateKind};
pub use types::review_log::ReviewLogEntry;
pub use types::timestamp::Timestamp;
