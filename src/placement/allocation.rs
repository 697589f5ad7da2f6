use indexmap::IndexMap;
use log::debug;

/// Items promised to characters whose in-world body the host has not built
/// yet. Consumed when the host instantiates the character.
#[derive(Clone, Debug, Default)]
pub struct Allocations(IndexMap<String, Vec<String>>);

impl Allocations {
    /// Replaces whatever `character` was promised before. An empty list
    /// clears the entry.
    pub fn assign<S: AsRef<str>>(&mut self, character: &str, items: &[S]) {
        self.0.shift_remove(character);
        if items.is_empty() {
            return;
        }
        let items: Vec<String> = items
            .iter()
            .map(|i| AsRef::<str>::as_ref(i).to_string())
            .collect();
        debug!("{} is to receive {:?}", character, items);
        self.0.insert(character.to_string(), items);
    }

    pub fn pending(&self, character: &str) -> Option<&[String]> {
        self.0.get(character).map(Vec::as_slice)
    }

    pub fn take(&mut self, character: &str) -> Option<Vec<String>> {
        self.0.shift_remove(character)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
