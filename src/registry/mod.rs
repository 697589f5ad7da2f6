pub mod items;
pub mod levels;
pub mod locations;

use std::cmp::Ordering;
use std::hash::Hash;

use indexmap::IndexMap;
use thiserror::Error;

use crate::data::DataError;
use crate::geo::GeoError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a location named {0} already exists")]
    DuplicateName(String),
    #[error("unknown location {0}")]
    UnknownLocation(String),
    #[error("unknown inventory item {0}")]
    UnknownItem(String),
    #[error("inventory item {0} has not been researched")]
    ItemUnavailable(String),
    #[error("{count} items selected, at most {max} allowed")]
    TooManyItems { count: usize, max: usize },
    #[error("selected items take {volume} L, at most {max} L allowed")]
    VolumeExceeded { volume: f32, max: f32 },
    #[error(transparent)]
    Geo(#[from] GeoError),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Anything that carries a queueing rank. Zero means never chosen; higher
/// ranks are listed first.
pub trait Ranked {
    fn queueing(&self) -> u32;
    fn set_queueing(&mut self, queueing: u32);
}

/// Rank an entry moves to when chosen: the bottom of the chosen entries the
/// first time, then roughly halfway to the top on each later choice.
pub fn promoted_rank(original: u32, max: u32) -> u32 {
    if original == 0 {
        1
    } else {
        max.min(max - (max - original) / 2 + 1)
    }
}

/// Result of re-ranking one chosen entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requeue<K> {
    pub from: u32,
    pub to: u32,
    /// Entries whose stored rank changed, the chosen one included.
    pub touched: Vec<K>,
}

impl<K> Requeue<K> {
    pub fn is_unchanged(&self) -> bool {
        self.touched.is_empty()
    }
}

/// Promotes `chosen` and renumbers every ranked entry so ranks run 1..=k
/// without gaps. `display_order` breaks ties between equal ranks the way the
/// registry lists them; the chosen entry itself sorts below its equal-ranked
/// peer on a first choice and above it afterwards.
///
/// Returns `None` when `chosen` is not in `entries`.
pub fn requeue<K, T, F>(
    entries: &mut IndexMap<K, T>,
    chosen: &K,
    display_order: F,
) -> Option<Requeue<K>>
where
    K: Hash + Eq + Clone,
    T: Ranked,
    F: Fn(&T, &T) -> Ordering,
{
    let chosen_index = entries.get_index_of(chosen)?;
    let original = entries[chosen_index].queueing();
    let max = entries.values().map(Ranked::queueing).max().unwrap_or(0);
    let promoted = promoted_rank(original, max);
    if promoted == original {
        return Some(Requeue {
            from: original,
            to: original,
            touched: Vec::new(),
        });
    }
    entries[chosen_index].set_queueing(promoted);

    let chosen_bias = if original == 0 { 0 } else { 2 };
    let bias = |index: usize| if index == chosen_index { chosen_bias } else { 1 };

    let mut ranked: Vec<usize> = (0..entries.len())
        .filter(|&i| entries[i].queueing() != 0)
        .collect();
    // bottom of the list first
    ranked.sort_by(|&a, &b| {
        entries[a]
            .queueing()
            .cmp(&entries[b].queueing())
            .then_with(|| bias(a).cmp(&bias(b)))
            .then_with(|| display_order(&entries[b], &entries[a]))
    });

    let mut touched = Vec::new();
    let mut to = promoted;
    for (position, &index) in ranked.iter().enumerate() {
        let rank = position as u32 + 1;
        if let Some((key, entry)) = entries.get_index_mut(index) {
            if index == chosen_index {
                to = rank;
                touched.push(key.clone());
            } else if entry.queueing() != rank {
                touched.push(key.clone());
            }
            entry.set_queueing(rank);
        }
    }

    Some(Requeue {
        from: original,
        to,
        touched,
    })
}
