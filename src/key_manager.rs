//! Key-signature-aware spelling with per-measure accidental memory.
//!
//! The manager starts from the spelling implied by the key and remembers
//! every alteration made since the last [`KeyManager::reset`], so that a
//! repeated pitch in the same measure doesn't get its accidental twice and
//! a pitch that returns to the key's spelling gets a courtesy mark.

use log::trace;

use crate::error::Result;
use crate::music::{relative_note_name, scale_tones, Accidental, KeyParts, Letter, NoteName};

/// Outcome of spelling one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedNote {
    pub note: NoteName,
    pub accidental: Option<Accidental>,
    /// The spelling differs from what was in force for this letter.
    pub change: bool,
}

#[derive(Debug, Clone)]
pub struct KeyManager {
    key: String,
    /// Current spelling per letter.
    scale_map: [NoteName; 7],
    /// Current spelling per pitch class.
    by_value: [Option<NoteName>; 12],
    /// Spelling per pitch class as implied by the key alone.
    original_by_value: [Option<NoteName>; 12],
}

impl Default for KeyManager {
    /// C major: every letter natural.
    fn default() -> Self {
        let naturals = Letter::ALL.map(NoteName::natural);
        let mut by_value = [None; 12];
        for name in naturals {
            by_value[slot(name.value())] = Some(name);
        }
        KeyManager {
            key: "C".to_string(),
            scale_map: naturals,
            by_value,
            original_by_value: by_value,
        }
    }
}

impl KeyManager {
    pub fn new(key: &str) -> Result<Self> {
        let mut manager = KeyManager {
            key: key.to_string(),
            scale_map: Letter::ALL.map(NoteName::natural),
            by_value: [None; 12],
            original_by_value: [None; 12],
        };
        manager.reset()?;
        Ok(manager)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: &str) -> Result<()> {
        self.key = key.to_string();
        self.reset()
    }

    /// Forget all alterations and go back to the key's own spelling.
    pub fn reset(&mut self) -> Result<()> {
        let parts = KeyParts::parse(&self.key)?;
        let tones = scale_tones(parts.root.value(), parts.intervals());

        self.by_value = [None; 12];
        self.original_by_value = [None; 12];
        for (i, tone) in tones.iter().enumerate() {
            let letter = parts.root.letter.step(i);
            let spelled = relative_note_name(letter, *tone)?;
            self.scale_map[letter.index()] = spelled;
            self.by_value[slot(*tone)] = Some(spelled);
            self.original_by_value[slot(*tone)] = Some(spelled);
        }
        Ok(())
    }

    /// Spell `note` against the current measure state, updating that state
    /// when the spelling changes.
    pub fn select_note(&mut self, note: NoteName) -> SelectedNote {
        let note = note.normalized();
        let root = note.letter;
        let value = note.value();
        let scale_note = self.scale_map[root.index()];

        if scale_note == note {
            return SelectedNote {
                note: scale_note,
                accidental: note.accidental,
                change: false,
            };
        }

        if let Some(value_note) = self.by_value[slot(value)] {
            return SelectedNote {
                note: value_note,
                accidental: value_note.accidental,
                change: false,
            };
        }

        if let Some(original) = self.original_by_value[slot(value)] {
            trace!("key {}: restoring {} for {}", self.key, original, note);
            // Recorded under the incoming letter, even for an enharmonic.
            self.scale_map[root.index()] = original;
            self.by_value[slot(scale_note.value())] = None;
            self.by_value[slot(value)] = Some(original);
            return SelectedNote {
                note: original,
                accidental: original.accidental,
                change: true,
            };
        }

        let current = self.scale_map[root.index()];
        self.by_value[slot(current.value())] = None;

        if note.accidental.is_none() {
            let natural = NoteName::natural(root);
            self.by_value[slot(natural.value())] = Some(natural);
            self.scale_map[root.index()] = natural;
            return SelectedNote {
                note: natural,
                accidental: None,
                change: true,
            };
        }

        self.by_value[slot(value)] = Some(note);
        self.scale_map[root.index()] = note;
        SelectedNote {
            note,
            accidental: note.accidental,
            change: true,
        }
    }
}

fn slot(value: i32) -> usize {
    value.rem_euclid(12) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> NoteName {
        s.parse().unwrap()
    }

    #[test]
    fn scale_notes_need_no_accidental() {
        let mut km = KeyManager::new("D").unwrap();
        let sel = km.select_note(name("f#"));
        assert_eq!(sel.note, name("f#"));
        assert!(!sel.change);
    }

    #[test]
    fn chromatic_note_is_marked_once_per_measure() {
        let mut km = KeyManager::new("C").unwrap();
        let first = km.select_note(name("c#"));
        assert_eq!(first.note, name("c#"));
        assert_eq!(first.accidental, Some(Accidental::Sharp));
        assert!(first.change);

        let again = km.select_note(name("c#"));
        assert!(!again.change);
    }

    #[test]
    fn returning_to_the_key_spelling_is_a_change() {
        let mut km = KeyManager::new("C").unwrap();
        km.select_note(name("c#"));
        let back = km.select_note(name("c"));
        assert_eq!(back.note, name("c"));
        assert_eq!(back.accidental, None);
        assert!(back.change);
    }

    #[test]
    fn flat_keys_respell_canonical_sharps() {
        let mut km = KeyManager::new("F").unwrap();
        let sel = km.select_note(name("a#"));
        assert_eq!(sel.note, name("bb"));
        assert_eq!(sel.accidental, Some(Accidental::Flat));
        assert!(!sel.change);
    }

    #[test]
    fn natural_in_a_sharp_key() {
        let mut km = KeyManager::new("G").unwrap();
        let sel = km.select_note(name("f"));
        assert_eq!(sel.note, name("f"));
        assert!(sel.change);
        let sharp_again = km.select_note(name("f#"));
        assert_eq!(sharp_again.note, name("f#"));
        assert!(sharp_again.change);
    }

    #[test]
    fn enharmonic_restore_claims_the_incoming_letter() {
        let mut km = KeyManager::new("G").unwrap();
        km.select_note(name("f"));
        let restored = km.select_note(name("gb"));
        assert_eq!(restored.note, name("f#"));
        assert!(restored.change);

        let g = km.select_note(name("g"));
        assert_eq!(g.note, name("g"));
        assert!(g.change);
    }

    #[test]
    fn reset_restores_key_spelling() {
        let mut km = KeyManager::new("C").unwrap();
        km.select_note(name("f#"));
        km.reset().unwrap();
        let sel = km.select_note(name("f#"));
        assert!(sel.change);
    }

    #[test]
    fn default_matches_c_major() {
        let mut built = KeyManager::new("C").unwrap();
        let mut default = KeyManager::default();
        for note in ["c", "c#", "f#", "bb", "b"] {
            assert_eq!(built.select_note(name(note)), default.select_note(name(note)));
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(KeyManager::new("X#").is_err());
    }
}
