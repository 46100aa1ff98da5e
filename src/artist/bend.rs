//! Bend chains: consecutive bends drawn as one phrase from an anchor note.

use std::collections::BTreeMap;

use log::debug;

use super::Artist;
use crate::error::Result;
use crate::note::{BendDirection, BendStep, Modifier, Tickable};
use crate::tuning::Fret;

/// An open chain of bends on the active stave.
#[derive(Debug, Clone, Default)]
pub(super) struct BendChain {
    /// Tab note that will carry the whole phrase
    start: Option<usize>,
    /// Anchor positions, in the order the chain was opened with
    start_strings: Vec<usize>,
    /// Steps per anchor position
    phrases: BTreeMap<usize, Vec<BendStep>>,
}

/// Describe a bend from one fret to another.
pub fn make_bend(from: u32, to: u32) -> BendStep {
    if from > to {
        return BendStep {
            direction: BendDirection::Down,
            text: String::new(),
        };
    }
    let text = match to - from {
        1 => "1/2".to_string(),
        2 => "Full".to_string(),
        3 => "1 1/2".to_string(),
        _ => format!("Bend to {to}"),
    };
    BendStep {
        direction: BendDirection::Up,
        text,
    }
}

impl Artist {
    /// Open a chain at `prev` or extend the one already open.
    pub(super) fn open_bends(
        &mut self,
        prev: usize,
        first_indices: &[usize],
        last_indices: &[usize],
    ) -> Result<()> {
        if self.bends.phrases.is_empty() {
            debug!("open bend chain at tab note {prev}");
            self.bends.start = Some(prev);
            self.bends.start_strings = first_indices.to_vec();
        }

        let notes = &self.stave()?.tab_notes;
        let (Some(Tickable::Tab(first)), Some(Tickable::Tab(last))) =
            (notes.get(prev), notes.last())
        else {
            return Ok(());
        };

        let steps: Vec<(usize, BendStep)> = self
            .bends
            .start_strings
            .iter()
            .zip(first_indices)
            .zip(last_indices)
            .filter_map(|((anchor, from_idx), to_idx)| {
                let from = first.positions.get(*from_idx)?.fret;
                let to = last.positions.get(*to_idx)?.fret;
                match (from, to) {
                    (Fret::Number(from), Fret::Number(to)) => Some((*anchor, make_bend(from, to))),
                    _ => None,
                }
            })
            .collect();

        for (anchor, step) in steps {
            self.bends.phrases.entry(anchor).or_default().push(step);
        }
        Ok(())
    }

    /// Flatten the open chain onto its anchor note and hide the notes it
    /// spans. `offset` 1 also hides the last note written.
    pub(super) fn close_bends(&mut self, offset: usize) {
        let chain = std::mem::take(&mut self.bends);
        let Some(start) = chain.start else {
            return;
        };
        debug!("close bend chain at tab note {start} (offset {offset})");

        let Some(idx) = self.current else {
            return;
        };
        let notes = &mut self.score.staves[idx].tab_notes;
        if let Some(anchor) = notes.get_mut(start) {
            for (index, phrase) in chain.phrases {
                anchor.add_modifier(index, Modifier::Bend { phrase });
            }
        }

        let end = (notes.len() + offset).saturating_sub(2);
        for note in notes.iter_mut().take(end + 1).skip(start + 1) {
            if let Tickable::Tab(tab) = note {
                tab.ghost = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bend_labels_by_interval() {
        assert_eq!(make_bend(10, 11).text, "1/2");
        assert_eq!(make_bend(10, 12).text, "Full");
        assert_eq!(make_bend(5, 8).text, "1 1/2");
        assert_eq!(make_bend(5, 9).text, "Bend to 9");
        assert_eq!(make_bend(7, 7).text, "Bend to 7");
    }

    #[test]
    fn release_has_no_label() {
        assert_eq!(
            make_bend(12, 10),
            BendStep {
                direction: BendDirection::Down,
                text: String::new()
            }
        );
    }
}
