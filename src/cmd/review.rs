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

//! The interactive terminal review loop.

use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use mnemo_core::Card;
use mnemo_core::Grade;
use mnemo_core::Note;
use mnemo_core::Queue;

use crate::collection::Collection;
use crate::collection::resolve_directory;
use crate::error::Result;
use crate::session::ReviewSession;

/// What the user asked for at the grading prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Input {
    Grade(Grade),
    Undo,
    Quit,
}

pub fn review_collection(
    directory: Option<String>,
    deck: Option<String>,
    reclaim_stale_lock: bool,
) -> Result<()> {
    let directory = resolve_directory(directory.as_deref().map(Path::new))?;
    let mut collection = Collection::open(&directory, reclaim_stale_lock)?;
    let mut session = ReviewSession::start(&mut collection.db, deck.as_deref())?;
    if session.remaining() == 0 {
        println!("Nothing is due.");
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    'cards: while let Some(card) = session.next_card()? {
        let note = session.note_for(&card)?;
        println!();
        println!("[{} left]", session.remaining());
        print_front(&card, note.as_ref());
        print!("(enter = show answer, q = quit) ");
        std::io::stdout().flush()?;
        match lines.next().transpose()? {
            None => break,
            Some(line) if line.trim() == "q" => break,
            Some(_) => {}
        }
        print_back(note.as_ref());
        let shown_at = Instant::now();
        loop {
            print!("1=again 2=hard 3=good 4=easy u=undo q=quit: ");
            std::io::stdout().flush()?;
            let line = match lines.next().transpose()? {
                Some(line) => line,
                None => break 'cards,
            };
            match parse_input(&line) {
                Some(Input::Grade(grade)) => {
                    let taken = shown_at.elapsed().as_millis().min(u32::MAX as u128) as u32;
                    if let Some(outcome) = session.answer(grade, taken)? {
                        print_outcome(outcome.next_queue, outcome.interval_days);
                    }
                    break;
                }
                Some(Input::Undo) => match session.undo() {
                    Ok(_) => {
                        println!("Undone.");
                        continue 'cards;
                    }
                    Err(e) => println!("{e}"),
                },
                Some(Input::Quit) => break 'cards,
                None => println!("Unrecognized input."),
            }
        }
    }

    println!();
    println!("Reviewed {} cards.", session.answered());
    Ok(())
}

fn parse_input(line: &str) -> Option<Input> {
    match line.trim() {
        "1" => Some(Input::Grade(Grade::Again)),
        "2" => Some(Input::Grade(Grade::Hard)),
        "3" => Some(Input::Grade(Grade::Good)),
        "4" => Some(Input::Grade(Grade::Easy)),
        "u" => Some(Input::Undo),
        "q" => Some(Input::Quit),
        _ => None,
    }
}

fn print_front(card: &Card, note: Option<&Note>) {
    match note.and_then(|n| n.fields.get("front")) {
        Some(field) => println!("{}", field.text),
        None => println!("(card {} has no front field)", card.id),
    }
}

fn print_back(note: Option<&Note>) {
    println!("---");
    let Some(note) = note else {
        println!("(missing note)");
        return;
    };
    for (name, field) in note.fields.iter().filter(|(name, _)| *name != "front") {
        println!("{}: {}", name, field.text);
    }
}

fn print_outcome(queue: Queue, interval_days: u32) {
    match queue {
        Queue::Learning { .. } | Queue::Relearning { .. } => {
            println!("Again shortly.");
        }
        Queue::Review { .. } => match interval_days {
            1 => println!("Next review tomorrow."),
            days => println!("Next review in {days} days."),
        },
        Queue::New => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_keys() {
        assert_eq!(parse_input("1"), Some(Input::Grade(Grade::Again)));
        assert_eq!(parse_input(" 3 "), Some(Input::Grade(Grade::Good)));
        assert_eq!(parse_input("4"), Some(Input::Grade(Grade::Easy)));
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(parse_input("u"), Some(Input::Undo));
        assert_eq!(parse_input("q"), Some(Input::Quit));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(parse_input("5"), None);
        assert_eq!(parse_input("good"), None);
        assert_eq!(parse_input(""), None);
    }
}
