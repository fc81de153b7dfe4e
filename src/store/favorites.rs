//! Favorited coin IDs. Lives for the session only.

/// Ordered set of favorited coin IDs.
#[derive(Debug, Clone, Default)]
pub struct Favorites {
    items: Vec<String>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` unless already present.
    pub fn add(&mut self, id: &str) {
        if !self.contains(id) {
            self.items.push(id.to_string());
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.items.retain(|item| item != id);
    }

    /// Flips membership of `id` and returns whether it is now a favorite.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.remove(id);
            false
        } else {
            self.add(id);
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item == id)
    }

    /// Favorites in the order they were added.
    pub fn items(&self) -> &[String] {
        &self.items
    }
}
