//! Process-wide interner for words and labels drawn on screen.
//!
//! The renderer keys its rasterized text by [`TextId`], so every distinct
//! string is laid out once per session no matter how many trials show it.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
pub use string_cache::DefaultAtom as Atom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextId(pub usize);

#[derive(Default)]
struct Interner {
    atoms: Vec<Atom>,
    ids: HashMap<Atom, TextId>,
}

lazy_static! {
    static ref TEXT_INTERNER: RwLock<Interner> = RwLock::new(Interner::default());
}

/// Intern a string and return its ID
pub fn intern_text(s: &str) -> TextId {
    let atom = Atom::from(s);
    if let Some(id) = TEXT_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .ids
        .get(&atom)
    {
        return *id;
    }
    let mut interner = TEXT_INTERNER.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(id) = interner.ids.get(&atom) {
        return *id;
    }
    let id = TextId(interner.atoms.len());
    interner.atoms.push(atom.clone());
    interner.ids.insert(atom, id);
    id
}

pub fn intern_all<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<TextId> {
    texts.into_iter().map(intern_text).collect()
}

pub fn get_text(id: TextId) -> Option<Atom> {
    TEXT_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .atoms
        .get(id.0)
        .cloned()
}

/// Current count of unique texts
pub fn text_count() -> usize {
    TEXT_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .atoms
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_gets_same_id() {
        let a = intern_text("pillow");
        let b = intern_text("pillow");
        assert_eq!(a, b);
        assert_eq!(get_text(a).as_deref(), Some("pillow"));
    }

    #[test]
    fn distinct_texts_get_distinct_ids() {
        let ids = intern_all(["\"cars", "have", "wheels\""]);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert!(text_count() >= 3);
    }

    #[test]
    fn unknown_id_is_none() {
        assert!(get_text(TextId(usize::MAX)).is_none());
    }
}
